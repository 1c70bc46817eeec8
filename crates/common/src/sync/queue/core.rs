//! Offline sync queue
//!
//! A durable FIFO of deferred HTTP mutations. Requests enqueued while the
//! device is offline survive restarts and are replayed in order once
//! connectivity returns, on a periodic timer, or immediately when a request
//! is enqueued while online. Draining is single-flight: overlapping triggers
//! collapse into one pass.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{QueueError, QueueResult};
use super::persistence::QueuePersistence;
use super::types::{QueueConfig, QueueStats, QueuedRequest, RequestDraft, SyncMetadata};
use crate::connectivity::ConnectivityMonitor;
use crate::http::HttpInvoker;
use crate::storage::KeyValueStore;
use crate::time::{Clock, SystemClock};

/// Live queue state behind one lock
///
/// Pending items and bookkeeping move together: a drain mutates both, and
/// persisting them from the same snapshot keeps the durable records
/// consistent with each other.
#[derive(Debug, Default)]
struct QueueState {
    items: Vec<QueuedRequest>,
    metadata: SyncMetadata,
}

/// Durable FIFO of pending HTTP mutations
///
/// # Drain triggers
///
/// 1. Enqueue while online
/// 2. Offline-to-online connectivity transition
/// 3. Periodic timer (`sync_interval`, 30s by default)
/// 4. Explicit [`SyncQueue::sync`] call
///
/// All four funnel into the same single-flight drain; a trigger that arrives
/// while a drain is running is dropped, not queued, because the running drain
/// already sees every pending item.
///
/// # Type Parameters
///
/// * `C` - Clock type for time operations (defaults to [`SystemClock`])
#[derive(Clone)]
pub struct SyncQueue<C = SystemClock>
where
    C: Clock + Clone,
{
    persistence: QueuePersistence,
    invoker: Arc<dyn HttpInvoker>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    clock: C,
    config: Arc<QueueConfig>,
    state: Arc<RwLock<QueueState>>,
    syncing: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    /// Long-lived tasks only (periodic drain, connectivity watch); one-shot
    /// drain triggers are fire-and-forget.
    handles: Arc<StdMutex<Vec<JoinHandle<()>>>>,
}

impl SyncQueue<SystemClock> {
    /// Create a queue with the default system clock
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        invoker: Arc<dyn HttpInvoker>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        config: QueueConfig,
    ) -> QueueResult<Self> {
        Self::with_clock(store, invoker, connectivity, config, SystemClock)
    }
}

impl<C> SyncQueue<C>
where
    C: Clock + Clone + 'static,
{
    /// Create a queue with an injected clock
    pub fn with_clock(
        store: Arc<dyn KeyValueStore>,
        invoker: Arc<dyn HttpInvoker>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        config: QueueConfig,
        clock: C,
    ) -> QueueResult<Self> {
        config.validate().map_err(QueueError::InvalidConfig)?;

        Ok(Self {
            persistence: QueuePersistence::new(store),
            invoker,
            connectivity,
            clock,
            config: Arc::new(config),
            state: Arc::new(RwLock::new(QueueState::default())),
            syncing: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
            handles: Arc::new(StdMutex::new(Vec::new())),
        })
    }

    /// Load persisted state and start the background drain triggers
    ///
    /// Restores the pending list and bookkeeping from the store, spawns the
    /// periodic drain timer and the connectivity watcher, and kicks off an
    /// immediate drain if a backlog survived the restart and the device is
    /// online. Without a Tokio runtime the background tasks are skipped with
    /// a warning; explicit `sync` calls still work.
    pub async fn initialize(&self) {
        match self.persistence.load_queue().await {
            Ok(items) => {
                if !items.is_empty() {
                    info!(pending = items.len(), "restored persisted sync queue");
                }
                self.state.write().await.items = items;
            }
            Err(e) => warn!(error = %e, "failed to load persisted queue, starting empty"),
        }

        match self.persistence.load_metadata().await {
            Ok(metadata) => self.state.write().await.metadata = metadata,
            Err(e) => warn!(error = %e, "failed to load sync metadata, resetting counters"),
        }

        self.start_periodic_sync();
        self.start_connectivity_watch();

        let has_backlog = { !self.state.read().await.items.is_empty() };
        if has_backlog && self.connectivity.is_connected() {
            self.trigger_sync();
        }
    }

    /// Stop background tasks and persist final state
    pub async fn shutdown(&self) {
        self.shutdown.store(true, AtomicOrdering::Relaxed);

        if let Ok(mut handles) = self.handles.lock() {
            for handle in handles.drain(..) {
                handle.abort();
            }
        }

        self.persist_queue().await;
        self.persist_metadata().await;
        info!("sync queue shut down");
    }

    /// Append a mutation to the queue, returning its assigned id
    ///
    /// The request is persisted before this returns. If the device is online
    /// a drain is triggered in the background; the caller never waits for
    /// network I/O.
    pub async fn enqueue(&self, draft: RequestDraft) -> String {
        let id = Uuid::new_v4().to_string();
        let queued = QueuedRequest {
            id: id.clone(),
            method: draft.method,
            endpoint: draft.endpoint,
            body: draft.body,
            headers: draft.headers,
            options: draft.options,
            enqueued_at: self.clock.millis_since_epoch(),
            retry_count: 0,
            max_retries: draft.max_retries.unwrap_or(self.config.default_max_retries),
        };

        let pending = {
            let mut state = self.state.write().await;
            state.items.push(queued);
            state.items.len()
        };
        self.persist_queue().await;

        debug!(id = %id, pending, "request enqueued");

        if self.connectivity.is_connected() {
            self.trigger_sync();
        }

        id
    }

    /// Drain the queue once, replaying pending requests in order
    ///
    /// Single-flight: a call that arrives while another drain is running
    /// returns immediately. A no-op when offline or when the queue is empty.
    /// One failing request consumes one retry attempt but never blocks the
    /// requests behind it.
    pub async fn sync(&self) {
        if self
            .syncing
            .compare_exchange(false, true, AtomicOrdering::SeqCst, AtomicOrdering::SeqCst)
            .is_err()
        {
            debug!("drain already in flight, skipping");
            return;
        }

        self.run_sync().await;
        self.syncing.store(false, AtomicOrdering::SeqCst);
    }

    /// Drop every pending request without replaying it
    ///
    /// Bookkeeping counters are untouched; only the pending list is emptied
    /// (and its empty form persisted).
    pub async fn clear_queue(&self) {
        let dropped = {
            let mut state = self.state.write().await;
            let dropped = state.items.len();
            state.items.clear();
            dropped
        };
        self.persist_queue().await;
        info!(dropped, "sync queue cleared");
    }

    /// Point-in-time queue statistics
    pub async fn get_stats(&self) -> QueueStats {
        let state = self.state.read().await;
        QueueStats {
            pending: state.items.len(),
            is_syncing: self.syncing.load(AtomicOrdering::SeqCst),
            is_online: self.connectivity.is_connected(),
            last_sync_at: state.metadata.last_sync_at,
            total_synced: state.metadata.total_synced,
            total_failed: state.metadata.total_failed,
        }
    }

    /// The actual drain pass; callers hold the single-flight guard.
    async fn run_sync(&self) {
        if !self.connectivity.is_connected() {
            debug!("offline, deferring drain");
            return;
        }

        let snapshot: Vec<QueuedRequest> = { self.state.read().await.items.clone() };
        if snapshot.is_empty() {
            return;
        }

        info!(pending = snapshot.len(), "draining sync queue");

        let mut synced = 0u64;
        let mut failed = 0u64;

        for queued in snapshot {
            match self.invoker.invoke(&queued.to_http_request()).await {
                Ok(response) => {
                    debug!(
                        id = %queued.id,
                        endpoint = %queued.endpoint,
                        status = response.status,
                        "queued request replayed"
                    );
                    let mut state = self.state.write().await;
                    state.items.retain(|item| item.id != queued.id);
                    synced += 1;
                }
                Err(e) => {
                    let mut state = self.state.write().await;
                    if let Some(item) = state.items.iter_mut().find(|item| item.id == queued.id) {
                        item.retry_count += 1;
                        let retry_count = item.retry_count;
                        let max_retries = item.max_retries;

                        if retry_count >= max_retries {
                            warn!(
                                id = %queued.id,
                                endpoint = %queued.endpoint,
                                retries = retry_count,
                                error = %e,
                                "retry budget exhausted, dropping request"
                            );
                            state.items.retain(|item| item.id != queued.id);
                            failed += 1;
                        } else {
                            debug!(
                                id = %queued.id,
                                endpoint = %queued.endpoint,
                                attempt = retry_count,
                                of = max_retries,
                                error = %e,
                                "replay failed, keeping for retry"
                            );
                        }
                    }
                }
            }
        }

        {
            let mut state = self.state.write().await;
            state.metadata.last_sync_at = self.clock.millis_since_epoch();
            state.metadata.total_synced += synced;
            state.metadata.total_failed += failed;
        }

        self.persist_queue().await;
        self.persist_metadata().await;

        info!(synced, failed, "drain finished");
    }

    /// Spawn a background drain, collapsing into any drain already running.
    ///
    /// Fire-and-forget: the drain is single-flight and `shutdown`'s final
    /// persist does not depend on it, so the handle is not retained.
    fn trigger_sync(&self) {
        match Handle::try_current() {
            Ok(runtime) => {
                let queue = self.clone();
                let _ = runtime.spawn(async move {
                    queue.sync().await;
                });
            }
            Err(_) => warn!("skipping drain trigger: no active Tokio runtime detected"),
        }
    }

    fn start_periodic_sync(&self) {
        match Handle::try_current() {
            Ok(runtime) => {
                let queue = self.clone();
                let interval = self.config.sync_interval;
                let shutdown = self.shutdown.clone();

                let handle = runtime.spawn(async move {
                    let mut interval = tokio::time::interval(interval);
                    interval.tick().await;

                    loop {
                        interval.tick().await;

                        if shutdown.load(AtomicOrdering::Relaxed) {
                            break;
                        }

                        queue.sync().await;
                    }
                });

                if let Ok(mut handles) = self.handles.lock() {
                    handles.push(handle);
                }
            }
            Err(_) => warn!("skipping periodic drain: no active Tokio runtime detected"),
        }
    }

    fn start_connectivity_watch(&self) {
        match Handle::try_current() {
            Ok(runtime) => {
                let queue = self.clone();
                let mut receiver = self.connectivity.subscribe();
                let shutdown = self.shutdown.clone();

                let handle = runtime.spawn(async move {
                    let mut was_connected = *receiver.borrow();

                    while receiver.changed().await.is_ok() {
                        if shutdown.load(AtomicOrdering::Relaxed) {
                            break;
                        }

                        let connected = *receiver.borrow();
                        if connected && !was_connected {
                            info!("connectivity restored, draining sync queue");
                            queue.sync().await;
                        }
                        was_connected = connected;
                    }
                });

                if let Ok(mut handles) = self.handles.lock() {
                    handles.push(handle);
                }
            }
            Err(_) => warn!("skipping connectivity watch: no active Tokio runtime detected"),
        }
    }

    async fn persist_queue(&self) {
        let snapshot: Vec<QueuedRequest> = { self.state.read().await.items.clone() };
        if let Err(e) = self.persistence.save_queue(&snapshot).await {
            warn!(error = %e, "failed to persist sync queue");
        }
    }

    async fn persist_metadata(&self) {
        let snapshot = { self.state.read().await.metadata.clone() };
        if let Err(e) = self.persistence.save_metadata(&snapshot).await {
            warn!(error = %e, "failed to persist sync metadata");
        }
    }
}
