//! Pictocode to weather condition mapping.
//!
//! See <https://docs.meteoblue.com/en/meteo/variables/pictograms> for the
//! provider's pictogram reference.

use serde::{Deserialize, Serialize};

/// Closed vocabulary of weather conditions understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "sunny")]
    Sunny,
    #[serde(rename = "clear-night")]
    ClearNight,
    #[serde(rename = "partlycloudy")]
    PartlyCloudy,
    #[serde(rename = "cloudy")]
    Cloudy,
    #[serde(rename = "fog")]
    Fog,
    #[serde(rename = "lightning")]
    Lightning,
    #[serde(rename = "lightning-rainy")]
    LightningRainy,
    #[serde(rename = "rainy")]
    Rainy,
    #[serde(rename = "pouring")]
    Pouring,
    #[serde(rename = "snowy")]
    Snowy,
    #[serde(rename = "snowy-rainy")]
    SnowyRainy,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Sunny => "sunny",
            Condition::ClearNight => "clear-night",
            Condition::PartlyCloudy => "partlycloudy",
            Condition::Cloudy => "cloudy",
            Condition::Fog => "fog",
            Condition::Lightning => "lightning",
            Condition::LightningRainy => "lightning-rainy",
            Condition::Rainy => "rainy",
            Condition::Pouring => "pouring",
            Condition::Snowy => "snowy",
            Condition::SnowyRainy => "snowy-rainy",
            Condition::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hourly pictocodes 1..=35 during daylight.
fn hourly_day(code: i32) -> Condition {
    match code {
        1..=3 => Condition::Sunny,
        _ => hourly_common(code),
    }
}

/// Hourly pictocodes 1..=35 at night.
fn hourly_night(code: i32) -> Condition {
    match code {
        1..=3 => Condition::ClearNight,
        _ => hourly_common(code),
    }
}

// Codes 4..=35 read the same by day and by night.
fn hourly_common(code: i32) -> Condition {
    match code {
        4..=9 => Condition::PartlyCloudy,
        10..=12 => Condition::Lightning,
        13..=18 => Condition::Fog,
        19..=22 => Condition::Cloudy,
        23 => Condition::Rainy,
        24 => Condition::Snowy,
        25 => Condition::Pouring,
        26 => Condition::Snowy,
        27 | 28 => Condition::LightningRainy,
        29 => Condition::Snowy,
        30 => Condition::LightningRainy,
        31 => Condition::SnowyRainy,
        32 => Condition::Snowy,
        33 => Condition::Rainy,
        34 => Condition::Snowy,
        35 => Condition::SnowyRainy,
        _ => Condition::Unknown,
    }
}

/// Map an hourly pictocode, picking the day or night table by `is_daylight`.
pub fn map_hourly(code: i32, is_daylight: bool) -> Condition {
    if is_daylight {
        hourly_day(code)
    } else {
        hourly_night(code)
    }
}

/// Map a daily pictocode (1..=17).
pub fn map_daily(code: i32) -> Condition {
    match code {
        1 => Condition::Sunny,
        2 | 3 => Condition::PartlyCloudy,
        4 => Condition::Cloudy,
        5 => Condition::Fog,
        6 | 7 => Condition::Rainy,
        8 => Condition::LightningRainy,
        9 | 10 => Condition::Snowy,
        11 => Condition::SnowyRainy,
        12 => Condition::Rainy,
        13 => Condition::Snowy,
        14 => Condition::Rainy,
        15 => Condition::Snowy,
        16 => Condition::Rainy,
        17 => Condition::Snowy,
        _ => Condition::Unknown,
    }
}
