use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the meteoblue service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("meteoblue responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("request to meteoblue failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// The response arrived but does not have the expected shape.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("meteoblue response is missing 'metadata'")]
    MissingMetadata,

    #[error("meteoblue response is missing required data package '{0}'")]
    MissingPackage(&'static str),

    #[error("malformed meteoblue response: {0}")]
    Malformed(String),

    #[error("invalid timestamp in meteoblue response: {0}")]
    InvalidTimestamp(String),
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),

    /// The first refresh failed, so setup cannot complete.
    #[error("weather data not ready: {0}")]
    NotReady(#[source] Box<WeatherError>),
}

impl WeatherError {
    pub fn is_timeout(&self) -> bool {
        match self {
            WeatherError::Transport(TransportError::Timeout(_)) => true,
            WeatherError::NotReady(inner) => inner.is_timeout(),
            _ => false,
        }
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_ready_keeps_the_cause() {
        let err = WeatherError::NotReady(Box::new(
            TransportError::Timeout(Duration::from_secs(15)).into(),
        ));

        assert!(err.is_timeout());
        assert!(err.to_string().contains("not ready"));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn validation_messages_name_the_package() {
        let err: WeatherError = ValidationError::MissingPackage("data_day").into();
        assert!(err.to_string().contains("data_day"));
        assert!(!err.is_timeout());
    }
}
