//! Fixtures shared by unit tests.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    error::{Result, WeatherError},
    model::{DAILY_KEY, HOURLY_KEY, WeatherPayload},
    provider::WeatherSource,
};

pub(crate) fn sample_json() -> Value {
    json!({
        "metadata": {
            "name": "Basel",
            "latitude": 47.56,
            "longitude": 7.57,
            "height": 279,
            "timezone_abbrevation": "CEST",
            "utc_timeoffset": 2.0,
            "modelrun_utc": "2024-06-01 06:00",
            "modelrun_updatetime_utc": "2024-06-01 09:30"
        },
        "data_1h": {
            "time": ["2024-06-01 10:00", "2024-06-01 11:00", "2024-06-01 12:00"],
            "temperature": [18.5, 19.2, 20.1],
            "pictocode": [23, 4, 1],
            "isdaylight": [1, 1, 0],
            "sealevelpressure": [1015.0, 1014.5, 1014.0],
            "windspeed": [3.2, 4.1, 5.0],
            "relativehumidity": [60, 58, 55]
        },
        "data_day": {
            "time": ["2024-06-01", "2024-06-02"],
            "temperature_max": [24.0, 21.5],
            "temperature_min": [12.0, 11.0],
            "pictocode": [2, 9]
        }
    })
}

pub(crate) fn sample_payload() -> WeatherPayload {
    WeatherPayload::from_json(sample_json(), &[HOURLY_KEY, DAILY_KEY])
        .expect("fixture is a valid payload")
}

#[derive(Debug)]
pub(crate) enum Step {
    Payload(WeatherPayload),
    Fail(fn() -> WeatherError),
    /// Never completes; only a timeout or cancellation ends the fetch.
    Hang,
}

/// A source that replays a fixed list of outcomes, one per fetch.
#[derive(Debug)]
pub(crate) struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherSource for ScriptedSource {
    async fn fetch(&self) -> Result<WeatherPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().expect("steps lock").pop_front();

        match step {
            Some(Step::Payload(payload)) => Ok(payload),
            Some(Step::Fail(make)) => Err(make()),
            Some(Step::Hang) | None => std::future::pending().await,
        }
    }
}
