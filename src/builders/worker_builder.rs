//! Builders to construct workers from configuration.

use std::collections::HashMap;

use crate::config::{SyncConfig, WorkerConfig};
use crate::core::{Spawn, SyncError, Worker};
use crate::runtime::TokioSpawner;

/// Builds a single named worker.
#[derive(Debug, Clone)]
pub struct WorkerBuilder {
    name: String,
    config: WorkerConfig,
    spawner: TokioSpawner,
}

impl WorkerBuilder {
    /// Start building the worker `name` from `config`.
    pub fn new(name: impl Into<String>, config: WorkerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            spawner: TokioSpawner::current(),
        }
    }

    /// Spawn admitted hooks on a specific runtime.
    #[must_use]
    pub fn with_runtime(mut self, handle: tokio::runtime::Handle) -> Self {
        self.spawner = TokioSpawner::new(handle);
        self
    }

    /// Worker name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Worker configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Validate the configuration and build the worker.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] naming the worker if validation
    /// fails.
    pub fn build(self) -> Result<Worker, SyncError> {
        let name = self.name;
        self.config
            .validate()
            .map_err(|e| SyncError::InvalidConfig(format!("worker `{name}` invalid: {e}")))?;
        tracing::debug!(worker = %name, capacity = self.config.capacity, "building worker");
        Ok(Worker::with_spawner(self.config.capacity, self.spawner)
            .with_default_timeout(self.config.schedule_timeout()))
    }
}

/// Build every worker in `cfg` on the ambient tokio runtime.
///
/// # Errors
///
/// Returns [`SyncError::InvalidConfig`] if the configuration is invalid.
pub fn build_workers(cfg: &SyncConfig) -> Result<HashMap<String, Worker>, SyncError> {
    build_workers_with(cfg, |_, _| Ok(TokioSpawner::current()))
}

/// Build every worker in `cfg`, asking `spawner_factory` for each worker's
/// spawner.
///
/// # Errors
///
/// Returns [`SyncError::InvalidConfig`] if the configuration is invalid, or
/// whatever error the factory returns.
pub fn build_workers_with<S, FS>(
    cfg: &SyncConfig,
    mut spawner_factory: FS,
) -> Result<HashMap<String, Worker<S>>, SyncError>
where
    S: Spawn,
    FS: FnMut(&str, &WorkerConfig) -> Result<S, SyncError>,
{
    cfg.validate()
        .map_err(|e| SyncError::InvalidConfig(format!("config invalid: {e}")))?;

    let mut workers = HashMap::with_capacity(cfg.workers.len());
    for (name, worker_cfg) in &cfg.workers {
        let spawner = spawner_factory(name, worker_cfg)?;
        let worker = Worker::with_spawner(worker_cfg.capacity, spawner)
            .with_default_timeout(worker_cfg.schedule_timeout());
        workers.insert(name.clone(), worker);
    }

    Ok(workers)
}
