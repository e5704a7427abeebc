//! Tests for utility functions

use prometheus_sync::util::{init_tracing, LOG_ENV};

#[test]
fn test_log_env_name() {
    assert_eq!(LOG_ENV, "PROMETHEUS_SYNC_LOG");
}

#[test]
fn test_init_tracing_installs_once() {
    // Another test in this binary may have installed it already.
    let _ = init_tracing();
    assert!(!init_tracing());
    tracing::debug!("subscriber installed");
}
