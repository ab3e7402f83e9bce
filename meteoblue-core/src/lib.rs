//! Core library for the meteoblue weather integration.
//!
//! This crate defines:
//! - Pictocode to condition mapping and forecast building
//! - Clients for the meteoblue packages API, plain and signed
//! - The update coordinator that polls and caches the latest payload
//! - The weather entity surface read by the host
//! - Configuration & credentials handling
//!
//! It is used by `meteoblue-cli`, but can also be embedded in other hosts.

pub mod condition;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod query;
pub mod setup;

#[cfg(test)]
pub(crate) mod testing;

pub use condition::{Condition, map_daily, map_hourly};
pub use config::{Config, LocationConfig};
pub use coordinator::{UpdateCoordinator, UpdateStatus};
pub use entity::{MeteoblueWeather, WeatherEntity};
pub use error::{TransportError, ValidationError, WeatherError};
pub use model::{ForecastRecord, WeatherPayload};
pub use provider::{SourceKind, WeatherSource};
pub use setup::Integration;
