//! Error types for hooks, scopes, and schedulers.

use std::sync::Arc;

use thiserror::Error;

/// Errors produced by the toolkit itself (as opposed to errors returned by
/// caller-supplied work).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A hook was passed to an entry point without an `on_run` body.
    #[error("hook has no on_run handler")]
    NoOnRun,
    /// The scope's deadline passed before the work finished or was admitted.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The scope was cancelled before the work finished or was admitted.
    #[error("scope canceled")]
    Canceled,
    /// A spawned task panicked or was cancelled by the runtime.
    #[error("task aborted: {0}")]
    TaskAborted(String),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Whether this is a deadline-exceeded or cancellation error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::DeadlineExceeded | Self::Canceled)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

/// Error handed to every caller sharing one single-flight execution.
pub type SharedError = Arc<anyhow::Error>;

/// Reports whether `err` is a deadline-exceeded or canceled error.
///
/// The whole `anyhow` context chain is inspected, so a timeout wrapped with
/// `.context(..)` by an `on_error` post-processor is still recognised.
#[must_use]
pub fn is_timeout_error(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<SyncError>())
        .any(SyncError::is_timeout)
}
