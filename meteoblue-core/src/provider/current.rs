use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, instrument};

use crate::{
    config::LocationConfig,
    error::{Result, TransportError, WeatherError},
    model::{CURRENT_KEY, DAILY_KEY, WeatherPayload},
    query::{CURRENT_PACKAGES, DEFAULT_BASE_URL},
};

use super::{WeatherSource, fetch_payload};

/// Plain API key client for the current conditions package.
#[derive(Debug, Clone)]
pub struct MeteoblueApiClient {
    http: Client,
    url: String,
    timeout: Duration,
}

impl MeteoblueApiClient {
    /// Hard limit for one request, body included.
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(location: &LocationConfig) -> Self {
        Self::with_base_url(location, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(location: &LocationConfig, base_url: &str) -> Self {
        let path = location.query(CURRENT_PACKAGES).path();

        Self {
            http: Client::new(),
            url: format!("{}{path}", base_url.trim_end_matches('/')),
            timeout: Self::TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One GET of `current_basic-day`; requires `data_current` and `data_day`.
    #[instrument(skip(self), fields(packages = CURRENT_PACKAGES))]
    pub async fn get_data(&self) -> Result<WeatherPayload> {
        let request = fetch_payload(&self.http, &self.url, &[CURRENT_KEY, DAILY_KEY]);

        let result = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(WeatherError::from(TransportError::Timeout(self.timeout))),
        };

        if let Err(e) = &result {
            error!(error = %e, "Error fetching data from Meteoblue");
        }

        result
    }
}

#[async_trait]
impl WeatherSource for MeteoblueApiClient {
    async fn fetch(&self) -> Result<WeatherPayload> {
        self.get_data().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(altitude: u32) -> LocationConfig {
        LocationConfig {
            name: "Basel".into(),
            api_key: "KEY".into(),
            latitude: 47.56,
            longitude: 7.57,
            altitude,
            shared_secret: None,
        }
    }

    #[test]
    fn url_targets_current_package() {
        let client = MeteoblueApiClient::new(&location(0));
        assert_eq!(
            client.url(),
            "https://my.meteoblue.com/packages/current_basic-day\
             ?lat=47.56&lon=7.57&apikey=KEY&format=json"
        );
    }

    #[test]
    fn url_carries_altitude_when_set() {
        let client = MeteoblueApiClient::with_base_url(&location(260), "http://127.0.0.1:8080/");
        assert!(client.url().starts_with("http://127.0.0.1:8080/packages/"));
        assert!(client.url().contains("&asl=260&"));
    }

    #[test]
    fn default_timeout_is_ten_seconds() {
        let client = MeteoblueApiClient::new(&location(0));
        assert_eq!(client.timeout, Duration::from_secs(10));
        let client = client.with_timeout(Duration::from_millis(50));
        assert_eq!(client.timeout, Duration::from_millis(50));
    }
}
