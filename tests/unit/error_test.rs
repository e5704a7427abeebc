//! Tests for error types

use anyhow::Context;
use prometheus_sync::core::{is_timeout_error, AppResult, SyncError};

#[test]
fn test_no_on_run_error() {
    let err = SyncError::NoOnRun;
    assert_eq!(format!("{}", err), "hook has no on_run handler");
    assert!(!err.is_timeout());
}

#[test]
fn test_deadline_exceeded_error() {
    let err = SyncError::DeadlineExceeded;
    assert_eq!(format!("{}", err), "deadline exceeded");
    assert!(err.is_timeout());
}

#[test]
fn test_canceled_error() {
    let err = SyncError::Canceled;
    assert_eq!(format!("{}", err), "scope canceled");
    assert!(err.is_timeout());
}

#[test]
fn test_task_aborted_error() {
    let err = SyncError::TaskAborted("task 7 panicked".to_string());
    assert_eq!(format!("{}", err), "task aborted: task 7 panicked");
    assert!(!err.is_timeout());
}

#[test]
fn test_invalid_config_error() {
    let err = SyncError::InvalidConfig("capacity".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: capacity");
}

#[test]
fn test_is_timeout_error_sees_wrapped_cause() {
    let result: AppResult<()> = Err(SyncError::Canceled.into());
    let err = result
        .context("fetch tokenizer")
        .context("prepare request")
        .unwrap_err();
    assert!(is_timeout_error(&err));
    assert_eq!(err.to_string(), "prepare request");
}

#[test]
fn test_is_timeout_error_rejects_lookalikes() {
    assert!(!is_timeout_error(&anyhow::anyhow!("deadline exceeded")));
    assert!(!is_timeout_error(&SyncError::TaskAborted("deadline".into()).into()));
}
