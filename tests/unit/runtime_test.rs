//! Tests for tokio spawner utilities

use std::time::Duration;

use prometheus_sync::core::{Hook, Scope, Spawn, Worker};
use prometheus_sync::runtime::tokio_spawner::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());
    assert!(spawner.handle().is_some());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test]
async fn test_tokio_spawner_current() {
    let spawner = TokioSpawner::current();
    assert!(spawner.handle().is_none());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send("ambient").unwrap();
    });
    assert_eq!(rx.await.expect("oneshot result"), "ambient");
}

#[test]
fn test_worker_on_dedicated_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("prometheus-sync-dedicated")
        .enable_all()
        .build()
        .expect("runtime");
    let worker = Worker::with_spawner(2, TokioSpawner::new(runtime.handle().clone()));

    // Driven from a separate current-thread runtime; hooks still land on
    // the dedicated one.
    let driver = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("driver");
    driver.block_on(async {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let tx = std::sync::Arc::new(parking_lot::Mutex::new(Some(tx)));
        worker
            .schedule(
                &Scope::new(),
                Duration::from_secs(1),
                Hook::new(move |_| {
                    let tx = std::sync::Arc::clone(&tx);
                    async move {
                        let name = std::thread::current().name().map(str::to_owned);
                        if let Some(tx) = tx.lock().take() {
                            let _ = tx.send(name);
                        }
                        Ok(())
                    }
                }),
            )
            .await
            .expect("admitted");
        let thread = rx.await.expect("hook ran");
        assert_eq!(thread.as_deref(), Some("prometheus-sync-dedicated"));
        worker.wait().await;
    });
}
