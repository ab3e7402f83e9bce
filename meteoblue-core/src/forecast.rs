//! Forecast rows built from the parallel arrays of a cached payload.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{
    condition::{map_daily, map_hourly},
    error::{Result, ValidationError, WeatherError},
    model::{DailyData, ForecastRecord, HourlyData},
};

/// Hourly rows older than this many minutes, relative to now, are dropped.
pub const HOURLY_GRACE_MINUTES: i64 = 30;

/// Resolve an IANA time zone name such as `Europe/Zurich`.
pub fn resolve_time_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>().map_err(|_| WeatherError::Config(format!("unknown time zone '{name}'")))
}

/// One row per day; never filtered.
pub fn build_daily(data: &DailyData) -> Vec<ForecastRecord> {
    data.time
        .iter()
        .zip(&data.temperature_max)
        .zip(&data.temperature_min)
        .zip(&data.pictocode)
        .map(|(((time, t_max), t_min), code)| ForecastRecord {
            timestamp: time.clone(),
            temperature: *t_max,
            temperature_low: Some(*t_min),
            condition: map_daily(*code),
        })
        .collect()
}

/// One row per hour, skipping rows more than [`HOURLY_GRACE_MINUTES`] old.
///
/// Timestamps are local times in `tz`. Surviving rows keep input order.
pub fn build_hourly(data: &HourlyData, now: DateTime<Utc>, tz: Tz) -> Result<Vec<ForecastRecord>> {
    let cutoff = now - Duration::minutes(HOURLY_GRACE_MINUTES);
    let mut forecasts = Vec::with_capacity(data.time.len());

    let rows = data.time.iter().zip(&data.temperature).zip(&data.pictocode).zip(&data.isdaylight);

    for (((time, temperature), code), isdaylight) in rows {
        if parse_instant(time, tz)? < cutoff {
            continue;
        }

        forecasts.push(ForecastRecord {
            timestamp: time.clone(),
            temperature: *temperature,
            temperature_low: None,
            condition: map_hourly(*code, *isdaylight != 0),
        });
    }

    Ok(forecasts)
}

/// Parse a provider timestamp; naive times are local to `tz`.
fn parse_instant(s: &str, tz: Tz) -> Result<DateTime<Utc>> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];

    for format in FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(localize(local, tz));
        }
    }

    // Any offset is dropped; the wall-clock time is read in `tz`.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(localize(dt.naive_local(), tz));
    }

    Err(ValidationError::InvalidTimestamp(s.to_string()).into())
}

fn localize(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Skipped by a DST jump: read it as the hour after.
        LocalResult::None => localize(local + Duration::hours(1), tz),
    }
}
