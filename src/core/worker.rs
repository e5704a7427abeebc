//! Bounded-concurrency scheduler.
//!
//! A [`Worker`] admits at most `capacity` hooks at a time. Each call to
//! [`Worker::schedule`] waits (up to its timeout) for an admission permit,
//! spawns the hook and returns straight away; the permit is released when the
//! hook finishes, fails, or panics. [`Worker::wait`] blocks until every
//! admitted hook has finished.
//!
//! ```rust,ignore
//! use prometheus_sync::core::{Hook, Scope, Worker};
//! use std::time::Duration;
//!
//! let worker = Worker::new(4);
//! let scope = Scope::new();
//!
//! for shard in shards {
//!     worker
//!         .schedule(&scope, Duration::from_secs(2), Hook::new(move |s| reindex(s, shard)))
//!         .await?;
//! }
//! worker.wait().await;
//! ```
//!
//! Operation errors never come back through `schedule`; give the hook an
//! `on_error` to observe them.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::runtime::TokioSpawner;

use super::{AppResult, Hook, Scope, SyncError};

/// Abstraction for spawning task execution on a runtime.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Counts admitted tasks that have not finished yet.
///
/// The mutex only guards the increment/decrement; waiters park on the condvar
/// (blocking) or the notify (async).
#[derive(Debug, Default)]
struct Outstanding {
    count: Mutex<usize>,
    idle: Condvar,
    drained: Notify,
}

impl Outstanding {
    fn enter(self: &Arc<Self>) -> OutstandingGuard {
        *self.count.lock() += 1;
        OutstandingGuard {
            outstanding: Arc::clone(self),
        }
    }

    fn leave(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            drop(count);
            self.idle.notify_all();
            self.drained.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        *self.count.lock()
    }

    async fn wait(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn wait_blocking(&self) {
        let mut count = self.count.lock();
        while *count != 0 {
            self.idle.wait(&mut count);
        }
    }
}

/// Marks one task finished when dropped, including on panic.
struct OutstandingGuard {
    outstanding: Arc<Outstanding>,
}

impl Drop for OutstandingGuard {
    fn drop(&mut self) {
        self.outstanding.leave();
    }
}

/// Default admission timeout for [`Worker::schedule_default`].
pub const DEFAULT_SCHEDULE_TIMEOUT: Duration = Duration::from_secs(1);

/// Bounded-concurrency scheduler.
///
/// Clones share the same permits and outstanding-task tracking.
#[derive(Debug, Clone)]
pub struct Worker<S = TokioSpawner> {
    capacity: usize,
    default_timeout: Duration,
    admission: Arc<Semaphore>,
    outstanding: Arc<Outstanding>,
    spawner: S,
}

impl Worker<TokioSpawner> {
    /// Create a worker that runs at most `capacity` hooks at once on the
    /// ambient tokio runtime.
    ///
    /// A capacity of zero is allowed; every schedule call then fails once its
    /// timeout elapses.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_spawner(capacity, TokioSpawner::current())
    }

    /// Create a worker from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] if the configuration is invalid.
    pub fn from_config(config: &WorkerConfig) -> Result<Self, SyncError> {
        config.validate().map_err(SyncError::InvalidConfig)?;
        Ok(Self::new(config.capacity).with_default_timeout(config.schedule_timeout()))
    }
}

impl<S: Spawn> Worker<S> {
    /// Create a worker that spawns admitted hooks through `spawner`.
    pub fn with_spawner(capacity: usize, spawner: S) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        info!(capacity, "worker created");
        Self {
            capacity,
            default_timeout: DEFAULT_SCHEDULE_TIMEOUT,
            admission: Arc::new(Semaphore::new(capacity)),
            outstanding: Arc::new(Outstanding::default()),
            spawner,
        }
    }

    /// Set the admission timeout used by [`Worker::schedule_default`].
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Admit `hook` if a permit frees up within `timeout`, then run it in the
    /// background.
    ///
    /// The hook runs under the scope derived for admission, so its deadline is
    /// whatever remained of `timeout` once it was admitted. Its result goes
    /// through `on_error` and is then dropped.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NoOnRun`] if the hook has no body.
    /// - [`SyncError::DeadlineExceeded`] or [`SyncError::Canceled`] if no
    ///   permit was acquired before the derived scope ended. The hook never
    ///   runs in that case.
    pub async fn schedule(&self, scope: &Scope, timeout: Duration, hook: Hook) -> AppResult<()> {
        let on_run = hook.runner()?;
        let child = scope.with_timeout(timeout);

        let permit = tokio::select! {
            biased;
            () = child.done() => {
                let err = child.err().unwrap_or(SyncError::DeadlineExceeded);
                warn!(
                    capacity = self.capacity,
                    ?timeout,
                    error = %err,
                    "schedule rejected: no admission slot in time"
                );
                return Err(err.into());
            }
            permit = Arc::clone(&self.admission).acquire_owned() => permit?,
        };

        let task_id = Uuid::new_v4();
        let guard = self.outstanding.enter();
        debug!(%task_id, "task admitted");

        self.spawner.spawn(async move {
            let _permit = permit;
            let _guard = guard;
            let result = on_run(child.clone()).await;
            match hook.apply(&child, result) {
                Ok(()) => debug!(%task_id, "task finished"),
                Err(err) => debug!(%task_id, error = %err, "task finished with error"),
            }
            child.cancel();
        });

        Ok(())
    }

    /// [`Worker::schedule`] with the worker's default timeout.
    ///
    /// # Errors
    ///
    /// Same as [`Worker::schedule`].
    pub async fn schedule_default(&self, scope: &Scope, hook: Hook) -> AppResult<()> {
        self.schedule(scope, self.default_timeout, hook).await
    }

    /// Wait until every admitted hook has finished.
    ///
    /// Hooks admitted while waiting are waited for as well. Nothing is
    /// cancelled.
    pub async fn wait(&self) {
        self.outstanding.wait().await;
    }

    /// Blocking form of [`Worker::wait`].
    ///
    /// Must not be called from an async worker thread; use it from plain
    /// threads or `spawn_blocking`.
    pub fn wait_blocking(&self) {
        self.outstanding.wait_blocking();
    }

    /// Maximum number of hooks running at once.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admission timeout used by [`Worker::schedule_default`].
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Admitted hooks that have not finished yet.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    /// Free admission permits.
    #[must_use]
    pub fn available(&self) -> usize {
        self.admission.available_permits()
    }
}
