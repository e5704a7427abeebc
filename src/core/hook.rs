//! Hooks: a unit of work plus an optional error post-processor.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::{AppResult, ErrorHandlerRegistry, Scope, SyncError};

/// Boxed, sendable future returned by hook bodies.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The unit of work carried by a [`Hook`].
pub type OnRun = Arc<dyn Fn(Scope) -> BoxFuture<AppResult<()>> + Send + Sync>;

/// Error post-processor carried by a [`Hook`].
///
/// Returning `Ok(())` swallows the error; returning `Err` passes the original
/// or a transformed error on.
pub type OnError = Arc<dyn Fn(&Scope, anyhow::Error) -> AppResult<()> + Send + Sync>;

/// A unit of work and an optional error post-processor.
///
/// Hooks are what [`wait`](crate::core::wait), [`timeout`](crate::core::timeout)
/// and [`Worker::schedule`](crate::core::Worker::schedule) run. A hook without
/// an `on_run` body is rejected by all of them with [`SyncError::NoOnRun`].
///
/// # Example
///
/// ```rust,ignore
/// use prometheus_sync::core::{Hook, SyncError};
///
/// let hook = Hook::new(|scope| async move {
///     tokio::select! {
///         () = scope.done() => Err(scope.err().unwrap_or(SyncError::Canceled).into()),
///         out = refresh_embeddings() => out,
///     }
/// })
/// .with_on_error(|_scope, err| {
///     tracing::warn!(error = %err, "embedding refresh failed");
///     Err(err)
/// });
/// ```
#[derive(Clone, Default)]
pub struct Hook {
    on_run: Option<OnRun>,
    on_error: Option<OnError>,
}

impl Hook {
    /// Create a hook from an async work function.
    pub fn new<F, Fut>(on_run: F) -> Self
    where
        F: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        Self::default().with_on_run(on_run)
    }

    /// Create a hook from a synchronous work function.
    ///
    /// The body runs on tokio's blocking thread pool, so it may perform
    /// blocking I/O without stalling the async workers.
    pub fn blocking<F>(on_run: F) -> Self
    where
        F: Fn(Scope) -> AppResult<()> + Send + Sync + 'static,
    {
        let on_run = Arc::new(on_run);
        Self::new(move |scope| {
            let on_run = Arc::clone(&on_run);
            async move {
                tokio::task::spawn_blocking(move || on_run(scope))
                    .await
                    .unwrap_or_else(|e| Err(SyncError::TaskAborted(e.to_string()).into()))
            }
        })
    }

    /// Replace the work function.
    #[must_use]
    pub fn with_on_run<F, Fut>(mut self, on_run: F) -> Self
    where
        F: Fn(Scope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.on_run = Some(Arc::new(move |scope| -> BoxFuture<AppResult<()>> {
            Box::pin(on_run(scope))
        }));
        self
    }

    /// Set the error post-processor.
    #[must_use]
    pub fn with_on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(&Scope, anyhow::Error) -> AppResult<()> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    /// Route errors through whatever handler `registry` holds at the time the
    /// error is raised.
    #[must_use]
    pub fn with_registry(self, registry: Arc<ErrorHandlerRegistry>) -> Self {
        self.with_on_error(move |scope, err| registry.handle(scope, err))
    }

    /// Whether the hook carries a work function.
    #[must_use]
    pub const fn has_on_run(&self) -> bool {
        self.on_run.is_some()
    }

    /// Whether the hook carries an error post-processor.
    #[must_use]
    pub const fn has_on_error(&self) -> bool {
        self.on_error.is_some()
    }

    pub(crate) fn runner(&self) -> Result<OnRun, SyncError> {
        self.on_run.clone().ok_or(SyncError::NoOnRun)
    }

    /// Apply the error post-processor to the outcome of `on_run`.
    ///
    /// `Ok` passes through untouched. An error goes through `on_error` when one
    /// is set and is returned unchanged otherwise.
    ///
    /// # Errors
    ///
    /// Returns whatever error survives post-processing.
    pub fn apply(&self, scope: &Scope, result: AppResult<()>) -> AppResult<()> {
        match (result, &self.on_error) {
            (Ok(()), _) => Ok(()),
            (Err(err), Some(on_error)) => on_error(scope, err),
            (Err(err), None) => Err(err),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("on_run", &self.has_on_run())
            .field("on_error", &self.has_on_error())
            .finish()
    }
}
