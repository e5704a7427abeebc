//! Telemetry helpers for structured logging.

use tracing_subscriber::EnvFilter;

/// Environment variable consulted first for the log filter.
pub const LOG_ENV: &str = "PROMETHEUS_SYNC_LOG";

/// Install a default fmt subscriber unless one is already set.
///
/// The filter comes from `PROMETHEUS_SYNC_LOG`, then `RUST_LOG`, and falls
/// back to `warn`. Returns `true` if this call installed the subscriber.
pub fn init_tracing() -> bool {
    if tracing::dispatcher::has_been_set() {
        return false;
    }
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .try_init()
        .is_ok()
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}
