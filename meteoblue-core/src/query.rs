//! Package request paths, plain and signed.
//!
//! A signed request carries an `expire` unix timestamp and a `sig` parameter:
//! the hex HMAC-SHA256 of the path and query string (everything before
//! `&sig=`), keyed by the account's shared secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Result, WeatherError};

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_BASE_URL: &str = "https://my.meteoblue.com";

/// Current conditions plus daily forecast.
pub const CURRENT_PACKAGES: &str = "current_basic-day";
/// Hourly plus daily forecast.
pub const FORECAST_PACKAGES: &str = "basic-1h_basic-day";

/// Signed URLs stay valid this long.
pub const SIGNATURE_TTL_SECS: i64 = 600;

/// Location and key for one package request.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageQuery<'a> {
    pub packages: &'a str,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: u32,
    pub api_key: &'a str,
}

impl PackageQuery<'_> {
    /// `?lat=..&lon=..[&asl=..]&apikey=..&format=json`
    pub fn path(&self) -> String {
        format!(
            "/packages/{}?lat={}&lon={}{}&apikey={}&format=json",
            self.packages,
            format_coordinate(self.latitude),
            format_coordinate(self.longitude),
            self.altitude_param(),
            self.api_key,
        )
    }

    /// Unsigned form used by the coordinator when no shared secret is set;
    /// the key leads the query string.
    pub fn keyed_path(&self) -> String {
        format!(
            "/packages/{}?apikey={}&lat={}&lon={}{}&format=json",
            self.packages,
            self.api_key,
            format_coordinate(self.latitude),
            format_coordinate(self.longitude),
            self.altitude_param(),
        )
    }

    /// Signed form, valid until `expire` (unix seconds).
    pub fn signed_path(&self, shared_secret: &str, expire: i64) -> Result<String> {
        let query = format!(
            "/packages/{}?lat={}&lon={}{}&apikey={}&expire={}&format=json",
            self.packages,
            format_coordinate(self.latitude),
            format_coordinate(self.longitude),
            self.altitude_param(),
            self.api_key,
            expire,
        );
        let sig = sign(shared_secret, &query)?;

        Ok(format!("{query}&sig={sig}"))
    }

    fn altitude_param(&self) -> String {
        if self.altitude == 0 {
            String::new()
        } else {
            format!("&asl={}", self.altitude)
        }
    }
}

/// Decimal form used in query strings and location ids. Whole degrees keep
/// one decimal place, so `10.0` stays `10.0` rather than `10`.
pub fn format_coordinate(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Lowercase hex HMAC-SHA256 of `query`.
pub fn sign(shared_secret: &str, query: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(shared_secret.as_bytes())
        .map_err(|e| WeatherError::Config(format!("invalid shared secret: {e}")))?;
    mac.update(query.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> PackageQuery<'static> {
        PackageQuery {
            packages: FORECAST_PACKAGES,
            latitude: 10.0,
            longitude: 20.0,
            altitude: 0,
            api_key: "K",
        }
    }

    #[test]
    fn plain_path_includes_altitude_only_when_set() {
        let mut q = query();
        q.packages = CURRENT_PACKAGES;
        assert_eq!(
            q.path(),
            "/packages/current_basic-day?lat=10.0&lon=20.0&apikey=K&format=json"
        );

        q.altitude = 260;
        assert_eq!(
            q.path(),
            "/packages/current_basic-day?lat=10.0&lon=20.0&asl=260&apikey=K&format=json"
        );
    }

    #[test]
    fn keyed_path_leads_with_api_key() {
        assert_eq!(
            query().keyed_path(),
            "/packages/basic-1h_basic-day?apikey=K&lat=10.0&lon=20.0&format=json"
        );
    }

    #[test]
    fn signature_matches_reference_digest() {
        let path = query().signed_path("S", 1_700_000_000).unwrap();

        assert_eq!(
            path,
            "/packages/basic-1h_basic-day?lat=10.0&lon=20.0&apikey=K&expire=1700000000&format=json\
             &sig=823c72d1553e12bf717c881df784f9b323e6583bd6cd54cd447ad9bd72770ce3"
        );
    }

    #[test]
    fn signature_is_deterministic() {
        let a = query().signed_path("S", 1_700_000_000).unwrap();
        let b = query().signed_path("S", 1_700_000_000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn signature_changes_with_every_input() {
        let base = query().signed_path("S", 1_700_000_000).unwrap();
        let sig = |path: &str| path.rsplit_once("&sig=").map(|(_, s)| s.to_string()).unwrap();
        let base_sig = sig(&base);

        let signed = |q: PackageQuery<'static>| q.signed_path("S", 1_700_000_000).unwrap();

        let mut latitude = query();
        latitude.latitude = 10.5;
        let mut longitude = query();
        longitude.longitude = 21.0;
        let mut api_key = query();
        api_key.api_key = "L";
        let mut altitude = query();
        altitude.altitude = 5;

        let variants = [
            query().signed_path("T", 1_700_000_000).unwrap(),
            query().signed_path("S", 1_700_000_001).unwrap(),
            signed(latitude),
            signed(longitude),
            signed(api_key),
            signed(altitude),
        ];

        for variant in variants {
            assert_ne!(sig(&variant), base_sig, "{variant}");
        }
    }

    #[test]
    fn whole_degrees_keep_a_decimal_place() {
        assert_eq!(format_coordinate(10.0), "10.0");
        assert_eq!(format_coordinate(-180.0), "-180.0");
        assert_eq!(format_coordinate(0.0), "0.0");
        assert_eq!(format_coordinate(47.56), "47.56");
        assert_eq!(format_coordinate(-7.125), "-7.125");
    }

    #[test]
    fn sign_covers_the_whole_query() {
        let path = query().signed_path("S", 42).unwrap();
        let (signed, sig) = path.rsplit_once("&sig=").unwrap();

        assert_eq!(sign("S", signed).unwrap(), sig);
        assert_eq!(sig.len(), 64);
    }
}
