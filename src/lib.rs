//! # Prometheus Sync
//!
//! Small concurrency toolkit for coordinating work across tokio tasks.
//!
//! Three primitives share one building block, the [`Hook`](core::Hook): a unit
//! of work plus an optional error post-processor.
//!
//! - **[`wait`](core::wait)**: give a hook a chance to finish within a timeout,
//!   but never hold the caller hostage and never cancel the work.
//! - **[`timeout`](core::timeout)**: run a hook under a derived
//!   [`Scope`](core::Scope) that expires with the deadline, and report
//!   `DeadlineExceeded` when it does.
//! - **[`Worker`](core::Worker)**: bounded-concurrency scheduler that admits at
//!   most N hooks at once and rejects admission after a per-call timeout.
//! - **[`SingleFlightGroup`](core::SingleFlightGroup)**: collapses concurrent
//!   calls for the same key into one execution with a shared result.
//!
//! ## Example
//!
//! ```rust,ignore
//! use prometheus_sync::core::{is_timeout_error, timeout, Hook, Scope, Worker};
//! use std::time::Duration;
//!
//! let scope = Scope::new();
//!
//! // Enforce a deadline on a single call.
//! let hook = Hook::new(|scope| async move { warm_cache(scope).await });
//! match timeout(&scope, Duration::from_millis(250), &hook).await {
//!     Err(e) if is_timeout_error(&e) => tracing::warn!("cache warm-up timed out"),
//!     other => other?,
//! }
//!
//! // Fan out with at most 8 hooks in flight.
//! let worker = Worker::new(8);
//! for doc in docs {
//!     worker
//!         .schedule(&scope, Duration::from_secs(1), Hook::new(move |s| embed(s, doc.clone())))
//!         .await?;
//! }
//! worker.wait().await;
//! ```
//!
//! For complete examples, see the integration tests under `tests/`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Hooks, scopes, executors, the worker, and single-flight.
pub mod core;
/// Configuration models for workers and timeouts.
pub mod config;
/// Builders to construct workers from configuration.
pub mod builders;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
