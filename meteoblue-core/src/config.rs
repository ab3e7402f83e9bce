use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{
    error::{Result, WeatherError},
    query::{DEFAULT_BASE_URL, PackageQuery, format_coordinate},
};

/// Credentials and coordinates for one configured location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Display name of the weather entity.
    pub name: String,
    pub api_key: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above sea level; 0 lets meteoblue pick the terrain height.
    #[serde(default)]
    pub altitude: u32,
    /// Enables signed, expiring request URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

impl LocationConfig {
    /// `"{latitude}-{longitude}"`; two locations with the same id are duplicates.
    pub fn unique_id(&self) -> String {
        format!(
            "{}-{}",
            format_coordinate(self.latitude),
            format_coordinate(self.longitude)
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(WeatherError::Config("API key must not be empty".into()));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(WeatherError::Config(format!(
                "latitude {} is out of range, expected -90 to 90",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(WeatherError::Config(format!(
                "longitude {} is out of range, expected -180 to 180",
                self.longitude
            )));
        }
        Ok(())
    }

    /// The shared secret, treating an empty string as unset.
    pub fn shared_secret(&self) -> Option<&str> {
        self.shared_secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn query<'a>(&'a self, packages: &'a str) -> PackageQuery<'a> {
        PackageQuery {
            packages,
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            api_key: &self.api_key,
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default display name for new locations.
    #[serde(default = "default_home_name")]
    pub home_name: String,

    /// IANA zone used to read hourly forecast timestamps.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Override for the meteoblue endpoint, e.g. a local mock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Example TOML:
    /// [[locations]]
    /// name = "Basel"
    /// api_key = "..."
    /// latitude = 47.56
    /// longitude = 7.57
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
}

fn default_home_name() -> String {
    "Home".to_string()
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_name: default_home_name(),
            time_zone: default_time_zone(),
            base_url: None,
            locations: Vec::new(),
        }
    }
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Validate and append a location, rejecting one that is already configured.
    pub fn add_location(&mut self, location: LocationConfig) -> Result<()> {
        location.validate()?;

        let id = location.unique_id();
        if self.location(&id).is_some() {
            return Err(WeatherError::Config(format!("location '{id}' is already configured")));
        }

        self.locations.push(location);
        Ok(())
    }

    pub fn remove_location(&mut self, unique_id: &str) -> Option<LocationConfig> {
        let idx = self.locations.iter().position(|l| l.unique_id() == unique_id)?;
        Some(self.locations.remove(idx))
    }

    pub fn location(&self, unique_id: &str) -> Option<&LocationConfig> {
        self.locations.iter().find(|l| l.unique_id() == unique_id)
    }

    /// The location named by `unique_id`, or the first configured one.
    pub fn select_location(&self, unique_id: Option<&str>) -> Result<&LocationConfig> {
        match unique_id {
            Some(id) => self.location(id).ok_or_else(|| {
                WeatherError::Config(format!(
                    "No location '{id}' configured.\n\
                     Hint: run `meteoblue list` to see configured locations."
                ))
            }),
            None => self.locations.first().ok_or_else(|| {
                WeatherError::Config(
                    "No location configured.\n\
                     Hint: run `meteoblue configure` and enter your API key."
                        .into(),
                )
            }),
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> anyhow::Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meteoblue", "meteoblue-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
