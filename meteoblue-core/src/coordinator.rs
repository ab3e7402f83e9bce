//! Periodic refresh of the cached payload.
//!
//! The coordinator is the only writer of the cache. Readers take an
//! `Arc<WeatherPayload>` snapshot, so they see either the previous payload or
//! the new one, never a mix. A failed or cancelled refresh leaves the cache
//! untouched and the next tick is the retry.

use std::{sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::{
    error::{Result, TransportError, WeatherError},
    model::WeatherPayload,
    provider::WeatherSource,
};

pub const UPDATE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Limit for one fetch on the coordinator path.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Outcome of the most recent refresh, broadcast to listeners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateStatus {
    /// Bumped after every completed refresh, successful or not.
    pub version: u64,
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct UpdateCoordinator {
    name: String,
    source: Box<dyn WeatherSource>,
    update_interval: Duration,
    fetch_timeout: Duration,
    data: ArcSwapOption<WeatherPayload>,
    status: watch::Sender<UpdateStatus>,
    refresh_lock: Mutex<()>,
}

impl UpdateCoordinator {
    pub fn new(name: impl Into<String>, source: Box<dyn WeatherSource>) -> Self {
        let (status, _) = watch::channel(UpdateStatus::default());

        Self {
            name: name.into(),
            source,
            update_interval: UPDATE_INTERVAL,
            fetch_timeout: FETCH_TIMEOUT,
            data: ArcSwapOption::empty(),
            status,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    /// Snapshot of the last successful payload.
    pub fn data(&self) -> Option<Arc<WeatherPayload>> {
        self.data.load_full()
    }

    pub fn status(&self) -> UpdateStatus {
        self.status.borrow().clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.status.borrow().last_update_success
    }

    /// Receive a new [`UpdateStatus`] after every refresh.
    pub fn subscribe(&self) -> watch::Receiver<UpdateStatus> {
        self.status.subscribe()
    }

    /// Refresh during setup. Any failure means the integration is not ready.
    pub async fn first_refresh(&self) -> Result<Arc<WeatherPayload>> {
        self.refresh().await.map_err(|e| WeatherError::NotReady(Box::new(e)))
    }

    /// Fetch once and swap the cache on success.
    ///
    /// On failure the error is recorded in the status, listeners are
    /// notified, the previous payload stays readable and the error is
    /// returned.
    #[instrument(skip(self), fields(name = %self.name))]
    pub async fn refresh(&self) -> Result<Arc<WeatherPayload>> {
        let _guard = self.refresh_lock.lock().await;
        let attempted_at = Utc::now();

        let outcome = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.fetch_timeout).into()),
        };

        match outcome {
            Ok(payload) => {
                let payload = Arc::new(payload);
                self.data.store(Some(Arc::clone(&payload)));
                self.status.send_modify(|status| {
                    status.version += 1;
                    status.last_update_success = true;
                    status.last_error = None;
                    status.last_attempt_at = Some(attempted_at);
                    status.last_success_at = Some(attempted_at);
                });
                info!("Weather data updated");
                Ok(payload)
            }
            Err(e) => {
                error!(error = %e, "Error fetching {} data", self.name);
                self.status.send_modify(|status| {
                    status.version += 1;
                    status.last_update_success = false;
                    status.last_error = Some(e.to_string());
                    status.last_attempt_at = Some(attempted_at);
                });
                Err(e)
            }
        }
    }

    /// Refresh every `update_interval` until `shutdown` is cancelled.
    ///
    /// The first tick fires one interval from now; setup is expected to have
    /// called [`first_refresh`](Self::first_refresh) already.
    pub async fn run(&self, shutdown: CancellationToken) {
        let start = Instant::now() + self.update_interval;
        let mut ticker = tokio::time::interval_at(start, self.update_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                result = self.refresh() => {
                    if let Err(e) = result {
                        debug!(error = %e, "Scheduled refresh failed, keeping last known data");
                    }
                }
            }
        }

        info!(name = %self.name, "Update coordinator stopped");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.run(shutdown).await })
    }
}
