//! Builders to construct workers from configuration.

pub mod worker_builder;

pub use worker_builder::{build_workers, build_workers_with, WorkerBuilder};
