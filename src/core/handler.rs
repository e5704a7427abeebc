//! Hot-swappable error handler registry.
//!
//! Call shapes that take a bare work function instead of a [`Hook`] route their
//! errors through an [`ErrorHandlerRegistry`]. The registry holds one handler
//! in an [`ArcSwap`], so readers never block a concurrent `set` and always see
//! either the old or the new handler in full.
//!
//! A process-wide registry is available through [`global`]. Tests that swap
//! handlers should prefer their own registry (via [`Hook::with_registry`]) or
//! call [`reset_error_handler`] when done.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use arc_swap::ArcSwap;

use super::{AppResult, Hook, OnError, Scope};

static GLOBAL: LazyLock<Arc<ErrorHandlerRegistry>> =
    LazyLock::new(|| Arc::new(ErrorHandlerRegistry::new()));

fn identity(_scope: &Scope, err: anyhow::Error) -> AppResult<()> {
    Err(err)
}

/// Holds the current error handler.
pub struct ErrorHandlerRegistry {
    current: ArcSwap<OnError>,
}

impl ErrorHandlerRegistry {
    /// Create a registry holding the identity handler, which returns every
    /// error unchanged.
    #[must_use]
    pub fn new() -> Self {
        let handler: OnError = Arc::new(identity);
        Self {
            current: ArcSwap::from_pointee(handler),
        }
    }

    /// Create a registry holding `handler`.
    #[must_use]
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Scope, anyhow::Error) -> AppResult<()> + Send + Sync + 'static,
    {
        let registry = Self::new();
        registry.set(handler);
        registry
    }

    /// Replace the current handler.
    pub fn set<F>(&self, handler: F)
    where
        F: Fn(&Scope, anyhow::Error) -> AppResult<()> + Send + Sync + 'static,
    {
        let handler: OnError = Arc::new(handler);
        self.current.store(Arc::new(handler));
    }

    /// Restore the identity handler.
    pub fn reset(&self) {
        self.set(identity);
    }

    /// Run `err` through the current handler.
    ///
    /// # Errors
    ///
    /// Returns whatever the handler returns.
    pub fn handle(&self, scope: &Scope, err: anyhow::Error) -> AppResult<()> {
        let handler = OnError::clone(&self.current.load());
        handler(scope, err)
    }
}

impl Default for ErrorHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandlerRegistry").finish_non_exhaustive()
    }
}

/// The process-wide registry.
#[must_use]
pub fn global() -> Arc<ErrorHandlerRegistry> {
    Arc::clone(&GLOBAL)
}

/// Replace the process-wide error handler.
pub fn set_error_handler<F>(handler: F)
where
    F: Fn(&Scope, anyhow::Error) -> AppResult<()> + Send + Sync + 'static,
{
    GLOBAL.set(handler);
    tracing::debug!("process-wide error handler replaced");
}

/// Restore the process-wide identity handler.
pub fn reset_error_handler() {
    GLOBAL.reset();
}

/// [`wait`](super::wait) for a bare work function, routing its error through
/// the process-wide handler.
///
/// # Errors
///
/// Same as [`wait`](super::wait).
pub async fn wait_handler<F, Fut>(scope: &Scope, timeout: Duration, handler: F) -> AppResult<()>
where
    F: Fn(Scope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    let hook = Hook::new(handler).with_registry(global());
    super::wait(scope, timeout, &hook).await
}

/// [`timeout`](super::timeout) for a bare work function, routing its error
/// through the process-wide handler.
///
/// # Errors
///
/// Same as [`timeout`](super::timeout).
pub async fn timeout_handler<F, Fut>(
    scope: &Scope,
    timeout: Duration,
    handler: F,
) -> AppResult<()>
where
    F: Fn(Scope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    let hook = Hook::new(handler).with_registry(global());
    super::timeout(scope, timeout, &hook).await
}
