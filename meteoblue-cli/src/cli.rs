use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use meteoblue_core::{
    Config, ForecastRecord, Integration, LocationConfig, SourceKind, WeatherEntity,
    forecast::resolve_time_zone,
};
use tracing::{info, warn};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteoblue", version, about = "Meteoblue weather CLI")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a location interactively.
    Configure,

    /// List configured locations.
    List,

    /// Remove a location by id ("{latitude}-{longitude}").
    Remove { id: String },

    /// Show current conditions.
    Show {
        /// Location id; defaults to the first configured location.
        #[arg(long)]
        location: Option<String>,

        /// Package set to request: "forecast" or "current".
        #[arg(long, default_value = "forecast")]
        source: String,
    },

    /// Show the daily forecast, or the hourly one with --hourly.
    Forecast {
        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        hourly: bool,
    },

    /// Keep polling and log every update until Ctrl-C.
    Watch {
        #[arg(long)]
        location: Option<String>,
    },
}

pub const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => {
                let location = prompt_location(&config)?;
                let id = location.unique_id();
                config.add_location(location)?;
                config.save()?;
                println!("Saved location {id}");
            }
            Command::List => {
                if config.locations.is_empty() {
                    println!("No locations configured. Run `meteoblue configure` first.");
                }
                for location in &config.locations {
                    let signed = if location.shared_secret().is_some() {
                        " (signed)"
                    } else {
                        ""
                    };
                    println!("{}  {}{signed}", location.unique_id(), location.name);
                }
            }
            Command::Remove { id } => match config.remove_location(&id) {
                Some(removed) => {
                    config.save()?;
                    println!("Removed {id} ({})", removed.name);
                }
                None => bail!("No location '{id}' configured"),
            },
            Command::Show { location, source } => {
                let kind = SourceKind::try_from(source.as_str())?;
                let location = config.select_location(location.as_deref())?;
                let integration = setup(&config, location, kind).await?;

                print_current(&integration.entity);
                integration.unload().await;
            }
            Command::Forecast { location, hourly } => {
                let location = config.select_location(location.as_deref())?;
                let integration = setup(&config, location, SourceKind::Forecast).await?;

                let rows = if hourly {
                    integration.entity.forecast_hourly(Utc::now())?
                } else {
                    integration.entity.forecast_daily()
                };
                print_forecast(rows.unwrap_or_default().as_slice(), hourly);
                integration.unload().await;
            }
            Command::Watch { location } => {
                let location = config.select_location(location.as_deref())?;
                let integration = setup(&config, location, SourceKind::Forecast).await?;
                print_current(&integration.entity);

                let mut updates = integration.coordinator.subscribe();
                loop {
                    tokio::select! {
                        signal = tokio::signal::ctrl_c() => {
                            signal.context("Failed to listen for Ctrl-C")?;
                            info!("Shutting down");
                            break;
                        }
                        changed = updates.changed() => {
                            if changed.is_err() {
                                break;
                            }
                            let status = updates.borrow_and_update().clone();
                            match status.last_error {
                                None => print_current(&integration.entity),
                                Some(e) => {
                                    warn!(error = %e, "Update failed, showing last known data")
                                }
                            }
                        }
                    }
                }
                integration.unload().await;
            }
        }

        Ok(())
    }
}

async fn setup(
    config: &Config,
    location: &LocationConfig,
    kind: SourceKind,
) -> anyhow::Result<Integration> {
    Integration::setup(config, location, kind)
        .await
        .with_context(|| format!("Failed to set up location '{}'", location.name))
}

fn prompt_location(config: &Config) -> anyhow::Result<LocationConfig> {
    let name = Text::new("Name:").with_default(&config.home_name).prompt()?;
    let api_key = Text::new("API key:").prompt()?;
    let latitude = CustomType::<f64>::new("Latitude:")
        .with_error_message("Please enter a number between -90 and 90")
        .prompt()?;
    let longitude = CustomType::<f64>::new("Longitude:")
        .with_error_message("Please enter a number between -180 and 180")
        .prompt()?;
    let altitude = CustomType::<u32>::new("Altitude (m above sea level):")
        .with_default(0)
        .with_error_message("Please enter a non-negative whole number")
        .prompt()?;
    let shared_secret = Text::new("Shared secret (optional):")
        .prompt_skippable()?
        .filter(|s| !s.trim().is_empty());

    if let Err(e) = resolve_time_zone(&config.time_zone) {
        warn!(error = %e, "Configured time zone is invalid; hourly forecasts will fail");
    }

    Ok(LocationConfig {
        name,
        api_key,
        latitude,
        longitude,
        altitude,
        shared_secret,
    })
}

fn print_current(entity: &impl WeatherEntity) {
    let fmt = |v: Option<f64>, unit: &str| match v {
        Some(v) => format!("{v} {unit}"),
        None => "n/a".to_string(),
    };

    println!("{}", entity.name());
    println!(
        "  Condition:   {}",
        entity.condition().map(|c| c.to_string()).unwrap_or_else(|| "n/a".into())
    );
    println!("  Temperature: {}", fmt(entity.native_temperature(), "°C"));
    println!("  Pressure:    {}", fmt(entity.native_pressure(), "hPa"));
    println!("  Wind speed:  {}", fmt(entity.native_wind_speed(), "km/h"));
    println!("  Humidity:    {}", fmt(entity.humidity(), "%"));
}

fn print_forecast(rows: &[ForecastRecord], hourly: bool) {
    if rows.is_empty() {
        println!("No forecast data available.");
        return;
    }

    for row in rows {
        match (hourly, row.temperature_low) {
            (false, Some(low)) => println!(
                "{:<12} {:>6.1}°C / {:>5.1}°C  {}",
                row.timestamp, row.temperature, low, row.condition
            ),
            _ => println!("{:<17} {:>6.1}°C  {}", row.timestamp, row.temperature, row.condition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_filter() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
        assert_eq!(log_filter_from_verbosity(1), "info");
        assert_eq!(log_filter_from_verbosity(2), "debug");
        assert_eq!(log_filter_from_verbosity(9), "trace");
    }

    #[test]
    fn parses_forecast_flags() {
        let cli =
            Cli::parse_from(["meteoblue", "-vv", "forecast", "--hourly", "--location", "1-2"]);

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Forecast { location, hourly } => {
                assert_eq!(location.as_deref(), Some("1-2"));
                assert!(hourly);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn show_defaults_to_forecast_source() {
        let cli = Cli::parse_from(["meteoblue", "show"]);
        match cli.command {
            Command::Show { source, location } => {
                assert_eq!(source, "forecast");
                assert!(location.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
