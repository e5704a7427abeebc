//! Configuration models for workers and timeouts.

pub mod worker;

pub use worker::{SyncConfig, WorkerConfig, CAPACITY_ENV, SCHEDULE_TIMEOUT_ENV};
