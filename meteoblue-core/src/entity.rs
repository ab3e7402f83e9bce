//! Weather entity surface over a coordinator's cached payload.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    condition::{Condition, map_hourly},
    config::LocationConfig,
    coordinator::UpdateCoordinator,
    error::Result,
    forecast::{build_daily, build_hourly, resolve_time_zone},
    model::{ForecastRecord, HourlyData, WeatherPayload},
};

pub const DOMAIN: &str = "meteoblue";
pub const MANUFACTURER: &str = "Meteoblue";

/// Native units of the values the entity reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Units {
    pub temperature: &'static str,
    pub pressure: &'static str,
    pub wind_speed: &'static str,
    pub visibility: &'static str,
}

pub const UNITS: Units = Units {
    temperature: "°C",
    pressure: "hPa",
    wind_speed: "km/h",
    visibility: "km",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastKind {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: (String, String),
    pub name: String,
    pub manufacturer: &'static str,
    pub entry_type: &'static str,
}

/// What the host reads from a weather entity.
pub trait WeatherEntity {
    fn name(&self) -> &str;
    fn unique_id(&self) -> &str;
    /// False while the last refresh failed; cached values stay readable.
    fn available(&self) -> bool;
    fn condition(&self) -> Option<Condition>;
    fn native_temperature(&self) -> Option<f64>;
    fn native_pressure(&self) -> Option<f64>;
    fn native_wind_speed(&self) -> Option<f64>;
    fn humidity(&self) -> Option<f64>;
    fn supported_forecasts(&self) -> &'static [ForecastKind];
    fn forecast_daily(&self) -> Option<Vec<ForecastRecord>>;
    fn forecast_hourly(&self, now: DateTime<Utc>) -> Result<Option<Vec<ForecastRecord>>>;
}

#[derive(Debug, Clone)]
pub struct MeteoblueWeather {
    coordinator: Arc<UpdateCoordinator>,
    name: String,
    unique_id: String,
    time_zone: String,
    device_info: DeviceInfo,
}

impl MeteoblueWeather {
    pub fn new(
        coordinator: Arc<UpdateCoordinator>,
        location: &LocationConfig,
        time_zone: impl Into<String>,
    ) -> Self {
        let unique_id = location.unique_id();

        Self {
            coordinator,
            name: location.name.clone(),
            device_info: DeviceInfo {
                identifiers: (DOMAIN.to_string(), unique_id.clone()),
                name: location.name.clone(),
                manufacturer: MANUFACTURER,
                entry_type: "service",
            },
            unique_id,
            time_zone: time_zone.into(),
        }
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn units(&self) -> Units {
        UNITS
    }

    pub fn coordinator(&self) -> &Arc<UpdateCoordinator> {
        &self.coordinator
    }

    fn data(&self) -> Option<Arc<WeatherPayload>> {
        self.coordinator.data()
    }

    fn first_hourly(&self, field: impl Fn(&HourlyData) -> Option<f64>) -> Option<f64> {
        self.data()?.data_1h.as_ref().and_then(field)
    }
}

impl WeatherEntity for MeteoblueWeather {
    fn name(&self) -> &str {
        &self.name
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn available(&self) -> bool {
        self.coordinator.last_update_success()
    }

    fn condition(&self) -> Option<Condition> {
        let data = self.data()?;

        if let Some(hourly) = &data.data_1h {
            let code = *hourly.pictocode.first()?;
            return Some(map_hourly(code, hourly.is_daylight(0)?));
        }

        let current = data.data_current.as_ref()?;
        Some(map_hourly(current.pictocode?, current.isdaylight? != 0))
    }

    fn native_temperature(&self) -> Option<f64> {
        let data = self.data()?;
        match &data.data_1h {
            Some(hourly) => hourly.temperature.first().copied(),
            None => data.data_current.as_ref()?.temperature,
        }
    }

    fn native_pressure(&self) -> Option<f64> {
        self.first_hourly(|h| h.sealevelpressure.first().copied())
    }

    fn native_wind_speed(&self) -> Option<f64> {
        let data = self.data()?;
        match &data.data_1h {
            Some(hourly) => hourly.windspeed.first().copied(),
            None => data.data_current.as_ref()?.windspeed,
        }
    }

    fn humidity(&self) -> Option<f64> {
        self.first_hourly(|h| h.relativehumidity.first().copied())
    }

    fn supported_forecasts(&self) -> &'static [ForecastKind] {
        &[ForecastKind::Daily, ForecastKind::Hourly]
    }

    fn forecast_daily(&self) -> Option<Vec<ForecastRecord>> {
        Some(build_daily(&self.data()?.data_day))
    }

    fn forecast_hourly(&self, now: DateTime<Utc>) -> Result<Option<Vec<ForecastRecord>>> {
        let tz = resolve_time_zone(&self.time_zone)?;

        let Some(data) = self.data() else {
            return Ok(None);
        };
        let Some(hourly) = &data.data_1h else {
            return Ok(None);
        };

        build_hourly(hourly, now, tz).map(Some)
    }
}
