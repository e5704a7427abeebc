//! Shared utilities.

pub mod telemetry;

pub use telemetry::{init_tracing, LOG_ENV};
