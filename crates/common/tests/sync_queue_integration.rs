//! Integration tests for the offline sync queue
//!
//! Runs the queue with its background tasks against the mock seams and real
//! (short) timer intervals. Restart scenarios build a second queue over the
//! same store.

use std::sync::Arc;
use std::time::Duration;

use perkwallet_common::http::HttpMethod;
use perkwallet_common::storage::{KeyValueStore, MemoryStore};
use perkwallet_common::sync::queue::{QueueConfig, RequestDraft, SyncQueue};
use perkwallet_common::testing::{MockConnectivity, MockHttpInvoker};
use perkwallet_common::time::MockClock;

struct Harness {
    queue: SyncQueue<MockClock>,
    store: Arc<MemoryStore>,
    invoker: Arc<MockHttpInvoker>,
    connectivity: Arc<MockConnectivity>,
    clock: MockClock,
}

fn harness(online: bool, config: QueueConfig) -> Harness {
    let store = Arc::new(MemoryStore::new());
    harness_over(store, online, config)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("perkwallet_common=debug")
        .with_test_writer()
        .try_init();
}

fn harness_over(store: Arc<MemoryStore>, online: bool, config: QueueConfig) -> Harness {
    init_tracing();
    let invoker = Arc::new(MockHttpInvoker::new());
    let connectivity = Arc::new(MockConnectivity::new(online));
    let clock = MockClock::new();
    let queue = SyncQueue::with_clock(
        store.clone(),
        invoker.clone(),
        connectivity.clone(),
        config,
        clock.clone(),
    )
    .expect("valid config");
    Harness { queue, store, invoker, connectivity, clock }
}

/// Poll until the queue is empty or the deadline passes.
async fn wait_for_drain(queue: &SyncQueue<MockClock>) -> bool {
    for _ in 0..100 {
        if queue.get_stats().await.pending == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Validates enqueue-while-online triggers a background drain without an
/// explicit `sync` call.
///
/// Assertions:
/// - Ensures the queue empties shortly after the enqueue.
/// - Confirms `invoker.request_count()` equals `1`.
#[tokio::test]
async fn test_enqueue_online_drains_in_background() {
    let h = harness(true, QueueConfig::default());
    h.queue.initialize().await;

    h.queue.enqueue(RequestDraft::new(HttpMethod::Post, "/points/redeem")).await;

    assert!(wait_for_drain(&h.queue).await, "enqueue never triggered a drain");
    assert_eq!(h.invoker.request_count(), 1);

    h.queue.shutdown().await;
}

/// Validates the offline-to-online transition triggers a drain.
///
/// Assertions:
/// - Confirms nothing is sent while offline.
/// - Ensures the queue empties shortly after connectivity returns.
#[tokio::test]
async fn test_connectivity_restoration_drains() {
    let h = harness(false, QueueConfig::default());
    h.queue.initialize().await;

    h.queue.enqueue(RequestDraft::new(HttpMethod::Post, "/points/redeem")).await;
    h.queue.enqueue(RequestDraft::new(HttpMethod::Put, "/profile")).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.invoker.request_count(), 0);
    assert_eq!(h.queue.get_stats().await.pending, 2);

    h.connectivity.set_connected(true);

    assert!(wait_for_drain(&h.queue).await, "reconnect never triggered a drain");
    assert_eq!(
        h.invoker.recorded_endpoints(),
        vec!["/points/redeem".to_string(), "/profile".to_string()]
    );

    h.queue.shutdown().await;
}

/// Validates the periodic timer retries a backlog no other trigger touches.
///
/// Assertions:
/// - Ensures the backlog drains once the invoker recovers, with no enqueue
///   or connectivity transition in between.
#[tokio::test]
async fn test_periodic_timer_drains_backlog() {
    let config = QueueConfig {
        sync_interval: Duration::from_millis(50),
        ..QueueConfig::default()
    };
    let h = harness(true, config);
    h.queue.initialize().await;

    // Generous retry budget so the failing drains never drop the request.
    h.invoker.set_failing(true);
    h.queue
        .enqueue(
            RequestDraft::new(HttpMethod::Post, "/points/redeem").with_max_retries(1000),
        )
        .await;

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(h.queue.get_stats().await.pending, 1);

    h.invoker.set_failing(false);

    assert!(wait_for_drain(&h.queue).await, "periodic timer never drained the backlog");

    h.queue.shutdown().await;
}

/// Validates concurrent drain triggers replay each request exactly once.
///
/// Assertions:
/// - Confirms `invoker.request_count()` equals the number of enqueued
///   requests after many concurrent `sync` calls.
#[tokio::test]
async fn test_concurrent_syncs_replay_exactly_once() {
    let h = harness(false, QueueConfig::default());

    for i in 0..5 {
        h.queue.enqueue(RequestDraft::new(HttpMethod::Post, format!("/item/{i}"))).await;
    }
    h.connectivity.set_connected(true);

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let queue = h.queue.clone();
        tasks.push(tokio::spawn(async move { queue.sync().await }));
    }
    for task in tasks {
        task.await.expect("sync task panicked");
    }

    // Whatever subset of triggers actually drained, nothing was sent twice.
    assert!(wait_for_drain(&h.queue).await);
    assert_eq!(h.invoker.request_count(), 5);
}

/// Validates restart recovery: a persisted backlog is restored and drained
/// by `initialize` when the device comes up online.
///
/// Assertions:
/// - Confirms the restored queue reports the persisted backlog.
/// - Ensures `initialize` drains it without any further trigger.
#[tokio::test]
async fn test_restart_restores_and_drains_backlog() {
    let store = Arc::new(MemoryStore::new());

    let before = harness_over(store.clone(), false, QueueConfig::default());
    before.queue.enqueue(RequestDraft::new(HttpMethod::Post, "/points/redeem")).await;
    before.queue.enqueue(RequestDraft::new(HttpMethod::Delete, "/coupon/9")).await;
    before.queue.shutdown().await;

    let after = harness_over(store, true, QueueConfig::default());
    after.queue.initialize().await;

    assert!(wait_for_drain(&after.queue).await, "initialize never drained the backlog");
    assert_eq!(
        after.invoker.recorded_endpoints(),
        vec!["/points/redeem".to_string(), "/coupon/9".to_string()]
    );

    after.queue.shutdown().await;
}

/// Validates mixed success and failure bookkeeping across a drain, including
/// the persisted metadata record.
///
/// Assertions:
/// - Confirms `stats.total_synced` equals `1` and `stats.total_failed`
///   equals `1`.
/// - Confirms `stats.last_sync_at` carries the mock clock's time.
/// - Ensures the persisted metadata record reflects the same counters.
#[tokio::test]
async fn test_drain_bookkeeping_is_persisted() {
    let h = harness(false, QueueConfig::default());
    h.invoker.fail_endpoint("/broken");
    h.clock.advance(Duration::from_secs(42));

    h.queue
        .enqueue(RequestDraft::new(HttpMethod::Post, "/broken").with_max_retries(1))
        .await;
    h.queue.enqueue(RequestDraft::new(HttpMethod::Post, "/healthy")).await;

    h.connectivity.set_connected(true);
    h.queue.sync().await;

    let stats = h.queue.get_stats().await;
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.total_synced, 1);
    assert_eq!(stats.total_failed, 1);
    assert!(stats.last_sync_at > 0);

    let raw = h
        .store
        .get(perkwallet_common::sync::queue::SYNC_METADATA_KEY)
        .await
        .unwrap()
        .unwrap();
    assert!(raw.contains("\"totalSynced\":1"));
    assert!(raw.contains("\"totalFailed\":1"));
}

/// Validates `clear_queue` is durable across a restart.
///
/// Assertions:
/// - Confirms a cleared queue stays empty in a new instance over the same
///   store.
#[tokio::test]
async fn test_clear_queue_survives_restart() {
    let store = Arc::new(MemoryStore::new());

    let before = harness_over(store.clone(), false, QueueConfig::default());
    before.queue.enqueue(RequestDraft::new(HttpMethod::Post, "/points/redeem")).await;
    before.queue.clear_queue().await;

    let after = harness_over(store, false, QueueConfig::default());
    after.queue.initialize().await;

    assert_eq!(after.queue.get_stats().await.pending, 0);
    after.queue.shutdown().await;
}

/// Validates a request that keeps failing is dropped once its retry budget
/// is spent, leaving the rest of the queue healthy.
///
/// Assertions:
/// - Confirms the failing request is gone after `max_retries` drains.
/// - Confirms the healthy request enqueued afterward still replays.
#[tokio::test]
async fn test_retry_budget_then_recovery() {
    let h = harness(false, QueueConfig::default());
    h.invoker.fail_endpoint("/broken");

    h.queue
        .enqueue(RequestDraft::new(HttpMethod::Post, "/broken").with_max_retries(2))
        .await;
    h.connectivity.set_connected(true);

    h.queue.sync().await;
    assert_eq!(h.queue.get_stats().await.pending, 1);

    h.queue.sync().await;
    assert_eq!(h.queue.get_stats().await.pending, 0);
    assert_eq!(h.queue.get_stats().await.total_failed, 1);

    h.queue.enqueue(RequestDraft::new(HttpMethod::Post, "/healthy")).await;
    assert!(wait_for_drain(&h.queue).await);
    assert_eq!(h.queue.get_stats().await.total_synced, 1);
}
