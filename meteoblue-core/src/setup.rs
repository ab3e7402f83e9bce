//! Setup and teardown of one configured location.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    config::{Config, LocationConfig},
    coordinator::UpdateCoordinator,
    entity::{DOMAIN, MeteoblueWeather},
    error::Result,
    provider::{SourceKind, WeatherSource, source_from_config},
};

/// A running location: its coordinator, the entity reading from it and the
/// polling task.
#[derive(Debug)]
pub struct Integration {
    pub coordinator: Arc<UpdateCoordinator>,
    pub entity: MeteoblueWeather,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Integration {
    /// Build the source for `location`, run the first refresh and start polling.
    ///
    /// A failed first refresh aborts setup with
    /// [`WeatherError::NotReady`](crate::WeatherError::NotReady) and nothing is
    /// left running.
    pub async fn setup(
        config: &Config,
        location: &LocationConfig,
        kind: SourceKind,
    ) -> Result<Self> {
        let source = source_from_config(kind, location, config.base_url())?;
        Self::setup_with_source(config, location, source).await
    }

    pub async fn setup_with_source(
        config: &Config,
        location: &LocationConfig,
        source: Box<dyn WeatherSource>,
    ) -> Result<Self> {
        let coordinator = Arc::new(UpdateCoordinator::new(DOMAIN, source));
        coordinator.first_refresh().await?;

        let entity = MeteoblueWeather::new(Arc::clone(&coordinator), location, &config.time_zone);
        let shutdown = CancellationToken::new();
        let task = coordinator.spawn(shutdown.clone());

        info!(location = %location.unique_id(), name = %location.name, "Meteoblue location set up");

        Ok(Self {
            coordinator,
            entity,
            shutdown,
            task: Some(task),
        })
    }

    /// Stop polling and wait for the loop to exit.
    pub async fn unload(mut self) {
        self.shutdown.cancel();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Update task ended abnormally");
            }
        }
    }
}

impl Drop for Integration {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
