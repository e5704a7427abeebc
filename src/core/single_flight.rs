//! Keyed call deduplication ("single-flight").
//!
//! Concurrent [`SingleFlightGroup::work`] calls for the same key share one
//! execution. The first caller runs its function inline; later callers
//! attach to the in-flight record and receive a clone of the same result
//! once it lands.
//!
//! ```rust,ignore
//! use prometheus_sync::core::SingleFlightGroup;
//!
//! let group = SingleFlightGroup::<Arc<ModelManifest>>::new();
//! let (manifest, shared) = group
//!     .work("llama-3-8b", || async { fetch_manifest("llama-3-8b").await })
//!     .await;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use super::{AppResult, SharedError};

/// Published result of one execution; `None` until the executor finishes.
type Slot<T> = Option<Result<T, SharedError>>;

/// In-flight record for one key.
struct Call<T> {
    done: watch::Receiver<Slot<T>>,
}

/// Suppresses duplicate concurrent executions of work keyed by a string.
pub struct SingleFlightGroup<T> {
    calls: Mutex<HashMap<String, Arc<Call<T>>>>,
}

enum Role<T> {
    Executor(watch::Sender<Slot<T>>, Arc<Call<T>>),
    Waiter(watch::Receiver<Slot<T>>),
}

impl<T: Clone> SingleFlightGroup<T> {
    /// Create an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` for `key` unless an execution for `key` is already in flight,
    /// in which case wait for that execution instead.
    ///
    /// Returns the result and whether it was shared: `false` for the caller
    /// that actually ran `f`, `true` for every caller that attached to it. An
    /// error is shared by all callers just like a value.
    ///
    /// If the executing caller is dropped before `f` finishes (or `f`
    /// panics), attached callers start over and one of them runs its own `f`.
    pub async fn work<F, Fut>(&self, key: &str, f: F) -> (Result<T, SharedError>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        loop {
            let role = {
                let mut calls = self.calls.lock();
                if let Some(call) = calls.get(key) {
                    Role::Waiter(call.done.clone())
                } else {
                    let (tx, rx) = watch::channel(None);
                    let call = Arc::new(Call { done: rx });
                    calls.insert(key.to_owned(), Arc::clone(&call));
                    Role::Executor(tx, call)
                }
            };

            match role {
                Role::Executor(tx, call) => {
                    let mut flight = Flight {
                        group: self,
                        key,
                        call,
                        tx: Some(tx),
                    };
                    let result = f().await.map_err(Arc::new);
                    flight.complete(result.clone());
                    return (result, false);
                }
                Role::Waiter(mut rx) => {
                    let published = rx.wait_for(Option::is_some).await.map(|slot| (*slot).clone());
                    if let Ok(Some(result)) = published {
                        return (result, true);
                    }
                    debug!(key, "single-flight executor went away, retrying");
                }
            }
        }
    }

    /// Drop any record for `key`, so the next call runs afresh instead of
    /// attaching to an execution already in flight.
    ///
    /// Callers already attached still receive that execution's result.
    pub fn forget(&self, key: &str) {
        if self.calls.lock().remove(key).is_some() {
            debug!(key, "single-flight key forgotten");
        }
    }

    /// Whether an execution for `key` is in flight.
    #[must_use]
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.calls.lock().contains_key(key)
    }

    /// Number of keys with an execution in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<T: Clone> Default for SingleFlightGroup<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SingleFlightGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlightGroup")
            .field("in_flight", &self.calls.lock().len())
            .finish()
    }
}

/// Executor-side handle on an in-flight record.
///
/// Publishes the result and removes the record under the map lock, so no
/// caller can attach to an already-finished execution. Dropped without
/// completing, it removes the record and closes the channel so waiters retry.
struct Flight<'a, T> {
    group: &'a SingleFlightGroup<T>,
    key: &'a str,
    call: Arc<Call<T>>,
    tx: Option<watch::Sender<Slot<T>>>,
}

impl<T> Flight<'_, T> {
    fn complete(&mut self, result: Result<T, SharedError>) {
        let mut calls = self.group.calls.lock();
        if let Some(tx) = self.tx.take() {
            tx.send_replace(Some(result));
        }
        self.remove_locked(&mut calls);
    }

    fn remove_locked(&self, calls: &mut HashMap<String, Arc<Call<T>>>) {
        // A forgotten key may already hold a newer record.
        if calls
            .get(self.key)
            .is_some_and(|call| Arc::ptr_eq(call, &self.call))
        {
            calls.remove(self.key);
        }
    }
}

impl<T> Drop for Flight<'_, T> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            let mut calls = self.group.calls.lock();
            self.remove_locked(&mut calls);
            drop(calls);
            self.tx = None;
        }
    }
}
