//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_sync::config::{SyncConfig, WorkerConfig, CAPACITY_ENV, SCHEDULE_TIMEOUT_ENV};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_worker_config_defaults() {
    let config = WorkerConfig::new();
    assert_eq!(config.capacity, num_cpus::get());
    assert_eq!(config.schedule_timeout(), Duration::from_secs(1));
    assert!(config.validate().is_ok());
}

#[test]
fn test_worker_config_zero_capacity_is_valid() {
    let config = WorkerConfig::new().with_capacity(0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_worker_config_invalid_timeout() {
    let invalid = WorkerConfig {
        capacity: 4,
        schedule_timeout_ms: 0,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_worker_config_from_lookup() {
    let config = WorkerConfig::from_lookup(lookup(&[
        (CAPACITY_ENV, "12"),
        (SCHEDULE_TIMEOUT_ENV, " 250 "),
    ]))
    .expect("valid environment");
    assert_eq!(config.capacity, 12);
    assert_eq!(config.schedule_timeout(), Duration::from_millis(250));
}

#[test]
fn test_worker_config_from_lookup_keeps_defaults() {
    let config = WorkerConfig::from_lookup(lookup(&[])).expect("defaults are valid");
    assert_eq!(config, WorkerConfig::default());
}

#[test]
fn test_worker_config_from_lookup_rejects_garbage() {
    let err = WorkerConfig::from_lookup(lookup(&[(CAPACITY_ENV, "lots")])).unwrap_err();
    assert!(err.contains(CAPACITY_ENV));

    let err = WorkerConfig::from_lookup(lookup(&[(SCHEDULE_TIMEOUT_ENV, "0")])).unwrap_err();
    assert!(err.contains("schedule_timeout_ms"));
}

#[test]
fn test_sync_config_validation() {
    let mut workers = HashMap::new();
    workers.insert("embed".to_string(), WorkerConfig::new().with_capacity(8));
    workers.insert("rerank".to_string(), WorkerConfig::new().with_capacity(2));
    let config = SyncConfig { workers };
    assert!(config.validate().is_ok());
}

#[test]
fn test_sync_config_requires_a_worker() {
    let config = SyncConfig {
        workers: HashMap::new(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_sync_config_names_invalid_worker() {
    let mut workers = HashMap::new();
    workers.insert(
        "broken".to_string(),
        WorkerConfig {
            capacity: 1,
            schedule_timeout_ms: 0,
        },
    );
    let err = SyncConfig { workers }.validate().unwrap_err();
    assert!(err.contains("broken"));
}

#[test]
fn test_sync_config_from_json() {
    let config = SyncConfig::from_json_str(
        r#"{
            "workers": {
                "embed": { "capacity": 8, "schedule_timeout_ms": 500 },
                "rerank": { "capacity": 2 }
            }
        }"#,
    )
    .expect("valid json");

    assert_eq!(config.workers["embed"].capacity, 8);
    assert_eq!(
        config.workers["embed"].schedule_timeout(),
        Duration::from_millis(500)
    );
    assert_eq!(config.workers["rerank"].schedule_timeout_ms, 1_000);
}

#[test]
fn test_sync_config_from_bad_json() {
    assert!(SyncConfig::from_json_str("{").is_err());
    assert!(SyncConfig::from_json_str(r#"{"workers": {}}"#).is_err());
}
