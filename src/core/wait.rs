//! Best-effort waiting and deadline enforcement for hooks.
//!
//! [`wait`] and [`timeout`] both run a hook's body on its own task and race it
//! against a clock. They differ in what happens when the clock wins:
//!
//! - [`wait`] gives up quietly. The body keeps running detached and its result
//!   is dropped. Anything the body captures must therefore stay valid for as
//!   long as the body runs, which the `'static` bound on hook bodies enforces.
//! - [`timeout`] hands the body a derived [`Scope`] that expires with the
//!   deadline, and reports [`SyncError::DeadlineExceeded`] (or
//!   [`SyncError::Canceled`]) to the caller. Bodies are expected to watch
//!   [`Scope::done`]; one that ignores it is not interrupted.

use std::time::Duration;

use tokio::task::JoinError;
use tracing::{debug, warn};

use super::{AppResult, Hook, Scope, SyncError};

/// Run `hook` and wait up to `timeout` for it to finish.
///
/// Returns the hook's post-processed result if it finishes in time, and
/// `Ok(())` if the timeout elapses or `scope` is done first. The body is never
/// cancelled by this function.
///
/// # Errors
///
/// - [`SyncError::NoOnRun`] if the hook has no body; nothing is spawned.
/// - Whatever error the body produced, after `on_error`.
pub async fn wait(scope: &Scope, timeout: Duration, hook: &Hook) -> AppResult<()> {
    let on_run = hook.runner()?;
    let mut task = tokio::spawn(on_run(scope.clone()));

    tokio::select! {
        biased;
        joined = &mut task => hook.apply(scope, flatten(joined)),
        () = tokio::time::sleep(timeout) => {
            debug!(?timeout, "wait elapsed, leaving hook running in background");
            Ok(())
        }
        () = scope.done() => {
            debug!("scope done during wait, leaving hook running in background");
            Ok(())
        }
    }
}

/// Run `hook` under a scope derived from `scope` that expires after `timeout`.
///
/// The derived scope is passed to both `on_run` and `on_error`, and is
/// cancelled on every exit path.
///
/// # Errors
///
/// - [`SyncError::NoOnRun`] if the hook has no body; nothing is spawned.
/// - [`SyncError::DeadlineExceeded`] or [`SyncError::Canceled`] if the derived
///   scope is done before the body finishes.
/// - Whatever error the body produced, after `on_error`.
pub async fn timeout(scope: &Scope, timeout: Duration, hook: &Hook) -> AppResult<()> {
    let on_run = hook.runner()?;
    let child = scope.with_timeout(timeout);
    let _cancel = child.cancel_on_drop();
    let mut task = tokio::spawn(on_run(child.clone()));

    tokio::select! {
        biased;
        joined = &mut task => hook.apply(&child, flatten(joined)),
        () = child.done() => {
            let err = child.err().unwrap_or(SyncError::DeadlineExceeded);
            debug!(?timeout, error = %err, "hook did not finish before its scope ended");
            Err(err.into())
        }
    }
}

fn flatten(joined: Result<AppResult<()>, JoinError>) -> AppResult<()> {
    joined.unwrap_or_else(|e| {
        warn!(error = %e, "hook task aborted");
        Err(SyncError::TaskAborted(e.to_string()).into())
    })
}
