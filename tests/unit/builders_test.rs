//! Tests for builder modules

use std::collections::HashMap;
use std::time::Duration;

use prometheus_sync::builders::{build_workers, build_workers_with, WorkerBuilder};
use prometheus_sync::config::{SyncConfig, WorkerConfig};
use prometheus_sync::core::SyncError;
use prometheus_sync::runtime::TokioSpawner;

fn two_workers() -> SyncConfig {
    let mut workers = HashMap::new();
    workers.insert(
        "embed".to_string(),
        WorkerConfig::new()
            .with_capacity(4)
            .with_schedule_timeout(Duration::from_millis(200)),
    );
    workers.insert("rerank".to_string(), WorkerConfig::new().with_capacity(1));
    SyncConfig { workers }
}

#[test]
fn test_worker_builder_defaults() {
    let config = WorkerConfig::new().with_capacity(6);
    let builder = WorkerBuilder::new("embed", config);
    assert_eq!(builder.name(), "embed");
    assert_eq!(builder.config().capacity, 6);

    let worker = builder.build().expect("valid config");
    assert_eq!(worker.capacity(), 6);
    assert_eq!(worker.available(), 6);
}

#[test]
fn test_worker_builder_rejects_invalid_config() {
    let config = WorkerConfig {
        capacity: 2,
        schedule_timeout_ms: 0,
    };
    match WorkerBuilder::new("broken", config).build() {
        Err(SyncError::InvalidConfig(msg)) => assert!(msg.contains("broken")),
        other => panic!("expected InvalidConfig, got {other:?}"),
    }
}

#[test]
fn test_build_workers() {
    let workers = build_workers(&two_workers()).expect("valid config");
    assert_eq!(workers.len(), 2);
    assert_eq!(workers["embed"].capacity(), 4);
    assert_eq!(workers["embed"].default_timeout(), Duration::from_millis(200));
    assert_eq!(workers["rerank"].capacity(), 1);
}

#[test]
fn test_build_workers_with_factory() {
    let mut asked = Vec::new();
    let workers = build_workers_with(&two_workers(), |name, _| {
        asked.push(name.to_string());
        Ok(TokioSpawner::current())
    })
    .expect("valid config");

    asked.sort();
    assert_eq!(asked, ["embed", "rerank"]);
    assert_eq!(workers.len(), 2);
}

#[test]
fn test_build_workers_propagates_factory_error() {
    let result = build_workers_with(&two_workers(), |_, _| {
        Err::<TokioSpawner, _>(SyncError::InvalidConfig("no runtime".into()))
    });
    assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
}

#[test]
fn test_build_workers_rejects_empty_config() {
    let config = SyncConfig {
        workers: HashMap::new(),
    };
    assert!(build_workers(&config).is_err());
}
