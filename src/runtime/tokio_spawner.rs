//! Tokio runtime spawner implementation.

use std::future::Future;

use tokio::runtime::Handle;

use crate::core::Spawn;

/// Tokio-based spawner used by [`Worker`](crate::core::Worker).
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    handle: Option<Handle>,
}

impl TokioSpawner {
    /// Create a spawner bound to a specific runtime.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Create a spawner that uses whichever runtime is current at spawn time.
    ///
    /// Spawning outside of a runtime panics, exactly like `tokio::spawn`.
    #[must_use]
    pub const fn current() -> Self {
        Self { handle: None }
    }

    /// The runtime this spawner is bound to, if any.
    #[must_use]
    pub const fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }
}

impl Spawn for TokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match &self.handle {
            Some(handle) => {
                handle.spawn(fut);
            }
            None => {
                tokio::spawn(fut);
            }
        }
    }
}
