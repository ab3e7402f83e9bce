use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, error, instrument};

use crate::{
    config::LocationConfig,
    error::Result,
    model::{DAILY_KEY, HOURLY_KEY, WeatherPayload},
    query::{DEFAULT_BASE_URL, FORECAST_PACKAGES, SIGNATURE_TTL_SECS},
};

use super::{WeatherSource, fetch_payload};

/// Client for the hourly and daily forecast packages.
///
/// With a shared secret every request gets a fresh signature that expires
/// [`SIGNATURE_TTL_SECS`] after it was built. The coordinator bounds each
/// fetch with its own timeout.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    http: Client,
    base_url: String,
    location: LocationConfig,
}

impl ForecastClient {
    pub fn new(location: &LocationConfig) -> Self {
        Self::with_base_url(location, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(location: &LocationConfig, base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            location: location.clone(),
        }
    }

    pub fn is_signed(&self) -> bool {
        self.location.shared_secret().is_some()
    }

    /// Full request URL as of `now`.
    pub fn url_at(&self, now: DateTime<Utc>) -> Result<String> {
        let query = self.location.query(FORECAST_PACKAGES);

        let path = match self.location.shared_secret() {
            Some(secret) => query.signed_path(secret, now.timestamp() + SIGNATURE_TTL_SECS)?,
            None => query.keyed_path(),
        };

        Ok(format!("{}{path}", self.base_url))
    }

    /// One GET of `basic-1h_basic-day`; requires `data_1h` and `data_day`.
    #[instrument(skip(self), fields(packages = FORECAST_PACKAGES, signed = self.is_signed()))]
    pub async fn get_data(&self) -> Result<WeatherPayload> {
        let url = self.url_at(Utc::now())?;
        debug!("Requesting forecast packages");

        let result = fetch_payload(&self.http, &url, &[HOURLY_KEY, DAILY_KEY]).await;
        if let Err(e) = &result {
            error!(error = %e, "Error fetching forecast from Meteoblue");
        }

        result
    }
}

#[async_trait]
impl WeatherSource for ForecastClient {
    async fn fetch(&self) -> Result<WeatherPayload> {
        self.get_data().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::sign;

    fn location(secret: Option<&str>) -> LocationConfig {
        LocationConfig {
            name: "Test".into(),
            api_key: "K".into(),
            latitude: 10.0,
            longitude: 20.0,
            altitude: 0,
            shared_secret: secret.map(str::to_string),
        }
    }

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn unsigned_url_without_secret() {
        let client = ForecastClient::with_base_url(&location(None), "http://mock");

        assert!(!client.is_signed());
        assert_eq!(
            client.url_at(at(1_700_000_000)).unwrap(),
            "http://mock/packages/basic-1h_basic-day?apikey=K&lat=10.0&lon=20.0&format=json"
        );
    }

    #[test]
    fn empty_secret_means_unsigned() {
        let client = ForecastClient::new(&location(Some("")));
        assert!(!client.is_signed());
    }

    #[test]
    fn signed_url_expires_ten_minutes_out() {
        let client = ForecastClient::new(&location(Some("S")));
        let url = client.url_at(at(1_700_000_000)).unwrap();

        assert!(client.is_signed());
        assert!(url.starts_with(
            "https://my.meteoblue.com/packages/basic-1h_basic-day?lat=10.0&lon=20.0"
        ));
        assert!(url.contains("&expire=1700000600&"));

        let path = url.trim_start_matches("https://my.meteoblue.com");
        let (signed, sig) = path.rsplit_once("&sig=").unwrap();
        assert_eq!(sign("S", signed).unwrap(), sig);
    }
}
