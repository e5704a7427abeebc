//! Hooks, scopes, timeout executors, the bounded worker, and single-flight.

pub mod error;
pub mod scope;
pub mod hook;
pub mod handler;
pub mod wait;
pub mod worker;
pub mod single_flight;

pub use error::{is_timeout_error, AppResult, SharedError, SyncError};
pub use scope::{CancelGuard, Scope};
pub use hook::{BoxFuture, Hook, OnError, OnRun};
pub use handler::{
    global, reset_error_handler, set_error_handler, timeout_handler, wait_handler,
    ErrorHandlerRegistry,
};
pub use wait::{timeout, wait};
pub use worker::{Spawn, Worker, DEFAULT_SCHEDULE_TIMEOUT};
pub use single_flight::SingleFlightGroup;
