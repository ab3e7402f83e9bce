use crate::{
    config::LocationConfig,
    error::{Result, TransportError, ValidationError, WeatherError},
    model::WeatherPayload,
    provider::{current::MeteoblueApiClient, forecast::ForecastClient},
};
use async_trait::async_trait;
use reqwest::Client;
use std::{fmt::Debug, sync::Arc};
use tracing::debug;

pub mod current;
pub mod forecast;

/// Which meteoblue package set a source requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// `current_basic-day`: current conditions plus daily forecast.
    Current,
    /// `basic-1h_basic-day`: hourly plus daily forecast, optionally signed.
    Forecast,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Current => "current",
            SourceKind::Forecast => "forecast",
        }
    }

    pub const fn all() -> &'static [SourceKind] {
        &[SourceKind::Current, SourceKind::Forecast]
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceKind {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "current" => Ok(SourceKind::Current),
            "forecast" => Ok(SourceKind::Forecast),
            _ => Err(WeatherError::Config(format!(
                "Unknown source '{value}'. Supported sources: current, forecast."
            ))),
        }
    }
}

/// Anything the coordinator can poll for a fresh payload.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self) -> Result<WeatherPayload>;
}

#[async_trait]
impl<T: WeatherSource + ?Sized> WeatherSource for Arc<T> {
    async fn fetch(&self) -> Result<WeatherPayload> {
        (**self).fetch().await
    }
}

/// Construct a source for `location` against `base_url`.
pub fn source_from_config(
    kind: SourceKind,
    location: &LocationConfig,
    base_url: &str,
) -> Result<Box<dyn WeatherSource>> {
    location.validate()?;

    let boxed: Box<dyn WeatherSource> = match kind {
        SourceKind::Current => Box::new(MeteoblueApiClient::with_base_url(location, base_url)),
        SourceKind::Forecast => Box::new(ForecastClient::with_base_url(location, base_url)),
    };

    Ok(boxed)
}

/// GET `url`, fail on non-2xx, then validate `metadata` plus `packages`.
pub(crate) async fn fetch_payload(
    http: &Client,
    url: &str,
    packages: &[&'static str],
) -> Result<WeatherPayload> {
    let res = http.get(url).send().await.map_err(TransportError::from)?;

    let status = res.status();
    let body = res.text().await.map_err(TransportError::from)?;

    if !status.is_success() {
        return Err(TransportError::Status {
            status,
            body: truncate_body(&body),
        }
        .into());
    }

    let value: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| ValidationError::Malformed(format!("invalid JSON: {e}")))?;

    let payload = WeatherPayload::from_json(value, packages)?;
    debug!(location = ?payload.metadata.name, "Successfully fetched data");

    Ok(payload)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> LocationConfig {
        LocationConfig {
            name: "Basel".into(),
            api_key: "KEY".into(),
            latitude: 47.56,
            longitude: 7.57,
            altitude: 0,
            shared_secret: None,
        }
    }

    #[test]
    fn source_kind_as_str_roundtrip() {
        for kind in SourceKind::all() {
            let parsed = SourceKind::try_from(kind.as_str()).expect("roundtrip should succeed");
            assert_eq!(*kind, parsed);
        }
        assert_eq!(SourceKind::try_from("FORECAST").unwrap(), SourceKind::Forecast);
    }

    #[test]
    fn unknown_source_error() {
        let err = SourceKind::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown source"));
    }

    #[test]
    fn source_from_config_rejects_invalid_location() {
        let mut loc = location();
        loc.api_key.clear();

        let err = source_from_config(SourceKind::Forecast, &loc, "http://localhost").unwrap_err();
        assert!(matches!(err, WeatherError::Config(_)));
    }

    #[test]
    fn source_from_config_builds_every_kind() {
        for kind in SourceKind::all() {
            assert!(source_from_config(*kind, &location(), "http://localhost").is_ok());
        }
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "ä".repeat(150);
        let truncated = truncate_body(&body);

        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
