//! Worker and toolkit configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable holding the default worker capacity.
pub const CAPACITY_ENV: &str = "PROMETHEUS_SYNC_WORKER_CAPACITY";
/// Environment variable holding the default admission timeout in milliseconds.
pub const SCHEDULE_TIMEOUT_ENV: &str = "PROMETHEUS_SYNC_SCHEDULE_TIMEOUT_MS";

const DEFAULT_SCHEDULE_TIMEOUT_MS: u64 = 1_000;

const fn default_schedule_timeout_ms() -> u64 {
    DEFAULT_SCHEDULE_TIMEOUT_MS
}

/// Configuration for a single [`Worker`](crate::core::Worker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Maximum hooks running at once. Zero is allowed and rejects everything.
    pub capacity: usize,
    /// Admission timeout used by `schedule_default`, in milliseconds.
    #[serde(default = "default_schedule_timeout_ms")]
    pub schedule_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            capacity: num_cpus::get(),
            schedule_timeout_ms: DEFAULT_SCHEDULE_TIMEOUT_MS,
        }
    }
}

impl WorkerConfig {
    /// Configuration with one slot per CPU and a one second admission timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the default admission timeout.
    #[must_use]
    pub fn with_schedule_timeout(mut self, timeout: Duration) -> Self {
        self.schedule_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The default admission timeout.
    #[must_use]
    pub const fn schedule_timeout(&self) -> Duration {
        Duration::from_millis(self.schedule_timeout_ms)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.schedule_timeout_ms == 0 {
            return Err("schedule_timeout_ms must be greater than 0".into());
        }
        Ok(())
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first if one exists. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed, or if the
    /// result fails validation.
    pub fn from_env() -> Result<Self, String> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Same as [`WorkerConfig::from_env`].
    pub fn from_lookup<L>(lookup: L) -> Result<Self, String>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup(CAPACITY_ENV) {
            cfg.capacity = raw
                .trim()
                .parse()
                .map_err(|e| format!("{CAPACITY_ENV}={raw:?}: {e}"))?;
        }
        if let Some(raw) = lookup(SCHEDULE_TIMEOUT_ENV) {
            cfg.schedule_timeout_ms = raw
                .trim()
                .parse()
                .map_err(|e| format!("{SCHEDULE_TIMEOUT_ENV}={raw:?}: {e}"))?;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Root configuration: named workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Map of worker name to configuration.
    pub workers: HashMap<String, WorkerConfig>,
}

impl SyncConfig {
    /// Validate all workers and ensure at least one exists.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid worker.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers.is_empty() {
            return Err("at least one worker must be defined".into());
        }
        for (name, worker) in &self.workers {
            worker
                .validate()
                .map_err(|e| format!("worker `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or validation fails.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
