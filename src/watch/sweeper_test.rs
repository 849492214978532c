use std::sync::Arc;
use std::time::Duration;

use crate::utils::time::now_millis;
use crate::ExpirationSweeper;
use crate::MockWatchRegistryApis;
use crate::PendingRequest;
use crate::WatchConfig;
use crate::WatchEventType;
use crate::WatchRegistry;
use crate::WatchRegistryApis;
use crate::Watcher;

#[tokio::test(start_paused = true)]
async fn test_sweeper_delivers_timeout_response() {
    let config = WatchConfig {
        sweep_interval_ms: 50,
        ..WatchConfig::default()
    };
    let registry = Arc::new(WatchRegistry::new(&config));

    // Already past its deadline when the first tick fires
    let (request, reply_rx) = PendingRequest::new(3);
    let watcher = Watcher::new(1, vec![b"a".to_vec()], 0, Box::new(request), now_millis() - 1).unwrap();
    let id = registry.register(watcher).unwrap();

    let sweeper = ExpirationSweeper::new(Arc::clone(&registry), &config);
    let shutdown = sweeper.shutdown_token();
    let handle = sweeper.spawn();

    let response = reply_rx.await.unwrap().unwrap();
    assert_eq!(response.event_type, WatchEventType::TimedOut as i32);
    assert!(!registry.contains(id));

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_leaves_future_deadlines_alone() {
    let config = WatchConfig {
        sweep_interval_ms: 50,
        ..WatchConfig::default()
    };
    let registry = Arc::new(WatchRegistry::new(&config));

    let (request, mut reply_rx) = PendingRequest::new(4);
    let watcher = Watcher::new(
        1,
        vec![b"a".to_vec()],
        0,
        Box::new(request),
        now_millis() + 3_600_000,
    )
    .unwrap();
    let id = registry.register(watcher).unwrap();

    let sweeper = ExpirationSweeper::new(Arc::clone(&registry), &config);
    let shutdown = sweeper.shutdown_token();
    let handle = sweeper.spawn();

    // Let several ticks elapse
    tokio::time::advance(Duration::from_millis(500)).await;

    assert!(registry.contains(id));
    assert!(reply_rx.try_recv().is_err());

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_stops_on_shutdown() {
    let mut registry = MockWatchRegistryApis::new();
    registry.expect_sweep_expired().returning(|_| Ok(0));

    let config = WatchConfig::default();
    let sweeper = ExpirationSweeper::new(Arc::new(registry), &config);
    let shutdown = sweeper.shutdown_token();
    let handle = sweeper.spawn();

    shutdown.cancel();
    handle.await.unwrap();
}
