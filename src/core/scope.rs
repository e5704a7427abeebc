//! Cancellation and deadline scopes.
//!
//! A [`Scope`] is the handle every hook body receives. It combines a
//! [`CancellationToken`] with an optional deadline. Scopes form a tree:
//! cancelling a scope cancels every scope derived from it, and a derived scope
//! never outlives its parent's deadline.
//!
//! ```rust,ignore
//! use prometheus_sync::core::Scope;
//! use std::time::Duration;
//!
//! let root = Scope::new();
//! let child = root.with_timeout(Duration::from_millis(50));
//!
//! root.cancel();
//! assert!(child.is_done());
//! ```

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::SyncError;

/// A cancellation/deadline scope handed to hook bodies.
///
/// Cloning is cheap and clones observe the same cancellation state.
#[derive(Debug, Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

#[derive(Debug)]
struct ScopeInner {
    token: CancellationToken,
    deadline: Option<Instant>,
    parent: Option<Scope>,
    /// Termination cause and when it took effect; never changes once set.
    cause: OnceLock<(SyncError, Instant)>,
}

impl Scope {
    /// Create a root scope with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Create a root scope driven by an existing cancellation token.
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                token,
                deadline: None,
                parent: None,
                cause: OnceLock::new(),
            }),
        }
    }

    /// Derive a scope that inherits this scope's cancellation and deadline.
    #[must_use]
    pub fn child(&self) -> Self {
        self.derive(self.inner.deadline)
    }

    /// Derive a scope that is done once `timeout` has elapsed.
    ///
    /// The derived deadline never extends past this scope's own deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Derive a scope that is done at `deadline` (or earlier, if this scope
    /// has an earlier deadline).
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.inner.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        self.derive(Some(deadline))
    }

    fn derive(&self, deadline: Option<Instant>) -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                token: self.inner.token.child_token(),
                deadline,
                parent: Some(self.clone()),
                cause: OnceLock::new(),
            }),
        }
    }

    /// Cancel this scope and every scope derived from it.
    pub fn cancel(&self) {
        let now = Instant::now();
        let _ = self
            .inner
            .cause
            .set(self.expired_by(now).unwrap_or((SyncError::Canceled, now)));
        self.inner.token.cancel();
    }

    /// Returns a guard that cancels this scope when dropped.
    #[must_use]
    pub fn cancel_on_drop(&self) -> CancelGuard {
        CancelGuard {
            scope: self.clone(),
        }
    }

    /// Whether the scope has been cancelled or its deadline has passed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.inner.token.is_cancelled() || self.past_deadline()
    }

    /// The reason this scope is done, or `None` while it is still live.
    ///
    /// Returns [`SyncError::DeadlineExceeded`] or [`SyncError::Canceled`],
    /// whichever took effect first. A scope cancelled through its parent
    /// reports the parent's cause unless its own deadline had already passed.
    #[must_use]
    pub fn err(&self) -> Option<SyncError> {
        self.termination().map(|(cause, _)| cause)
    }

    fn termination(&self) -> Option<(SyncError, Instant)> {
        if let Some(cause) = self.inner.cause.get() {
            return Some(cause.clone());
        }
        let cause = if self.inner.token.is_cancelled() {
            // Our own cancel always records a cause, so this came from above.
            let inherited = self
                .inner
                .parent
                .as_ref()
                .and_then(Self::termination)
                .unwrap_or((SyncError::Canceled, Instant::now()));
            self.expired_by(inherited.1).unwrap_or(inherited)
        } else {
            self.expired_by(Instant::now())?
        };
        Some(self.inner.cause.get_or_init(|| cause).clone())
    }

    fn expired_by(&self, at: Instant) -> Option<(SyncError, Instant)> {
        self.inner
            .deadline
            .filter(|deadline| *deadline <= at)
            .map(|deadline| (SyncError::DeadlineExceeded, deadline))
    }

    /// Resolves once the scope is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.inner.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.inner.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.inner.token.cancelled().await,
        }
    }

    /// The scope's deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline, saturating at zero.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// The underlying cancellation token.
    ///
    /// The token fires on explicit cancellation only. Expiry of the deadline
    /// is observed through [`Scope::done`] and [`Scope::is_done`].
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    fn past_deadline(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancels its scope when dropped. See [`Scope::cancel_on_drop`].
#[derive(Debug)]
#[must_use = "the scope is cancelled as soon as the guard is dropped"]
pub struct CancelGuard {
    scope: Scope,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
