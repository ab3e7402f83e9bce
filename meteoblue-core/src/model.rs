use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::{condition::Condition, error::ValidationError};

/// Top-level key every valid response carries.
pub const METADATA_KEY: &str = "metadata";
pub const CURRENT_KEY: &str = "data_current";
pub const HOURLY_KEY: &str = "data_1h";
pub const DAILY_KEY: &str = "data_day";

/// Decoded meteoblue response, replaced wholesale on every successful poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_current: Option<CurrentData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_1h: Option<HourlyData>,
    pub data_day: DailyData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub height: Option<f64>,
    /// Spelled this way by the provider.
    pub timezone_abbrevation: Option<String>,
    pub utc_timeoffset: Option<f64>,
    pub modelrun_utc: Option<String>,
    pub modelrun_updatetime_utc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentData {
    pub time: Option<String>,
    pub isdaylight: Option<u8>,
    pub pictocode: Option<i32>,
    pub temperature: Option<f64>,
    pub windspeed: Option<f64>,
}

/// Parallel per-hour arrays from the `basic-1h` package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HourlyData {
    pub time: Vec<String>,
    pub temperature: Vec<f64>,
    pub pictocode: Vec<i32>,
    pub isdaylight: Vec<u8>,
    pub sealevelpressure: Vec<f64>,
    pub windspeed: Vec<f64>,
    pub relativehumidity: Vec<f64>,
}

/// Parallel per-day arrays from the `basic-day` package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyData {
    pub time: Vec<String>,
    pub temperature_max: Vec<f64>,
    pub temperature_min: Vec<f64>,
    pub pictocode: Vec<i32>,
}

/// One forecast row handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    pub timestamp: String,
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_low: Option<f64>,
    pub condition: Condition,
}

impl WeatherPayload {
    /// Check that `metadata` and every key in `packages` are present, then
    /// decode into the typed payload.
    pub fn from_json(value: Value, packages: &[&'static str]) -> Result<Self, ValidationError> {
        let Some(object) = value.as_object() else {
            error!(payload = %value, "Invalid API response (not a JSON object)");
            return Err(ValidationError::Malformed("response is not a JSON object".into()));
        };

        if !object.contains_key(METADATA_KEY) {
            error!(payload = %value, "Invalid API response (missing metadata)");
            return Err(ValidationError::MissingMetadata);
        }

        if let Some(missing) = packages.iter().find(|key| !object.contains_key(**key)) {
            error!(
                payload = %value,
                package = *missing,
                "API response missing required data package"
            );
            return Err(ValidationError::MissingPackage(*missing));
        }

        serde_json::from_value(value).map_err(|e| {
            error!(error = %e, "API response has unexpected shape");
            ValidationError::Malformed(e.to_string())
        })
    }
}

impl HourlyData {
    pub fn is_daylight(&self, idx: usize) -> Option<bool> {
        self.isdaylight.get(idx).map(|flag| *flag != 0)
    }
}
