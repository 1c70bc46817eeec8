//! Two-tier persistent cache
//!
//! A bounded in-memory map in front of the durable key-value store. Reads hit
//! memory first and fall through to the durable tier; writes land in both.
//! A metadata record indexes every durable entry so `clear` and `cleanup`
//! never need a full store scan.
//!
//! The public surface never returns an error: store failures and corrupt
//! payloads are logged and degrade to a cache miss or a skipped persist,
//! because the cache is an optimization, not a source of truth.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::{CacheConfig, CACHE_METADATA_KEY};
use super::entry::{CacheEntry, CacheMetadata};
use super::stats::{CacheStats, MetricsCollector};
use crate::storage::KeyValueStore;
use crate::time::{Clock, SystemClock};

/// In-memory entry with its insertion sequence for eviction ordering.
#[derive(Debug, Clone)]
struct HeldEntry {
    entry: CacheEntry,
    insertion_order: u64,
}

/// The bounded in-memory tier.
#[derive(Debug, Default)]
struct MemoryTier {
    entries: HashMap<String, HeldEntry>,
    insertion_counter: u64,
}

/// Expiry-aware cache over a durable key-value store
///
/// Serves arbitrary JSON-serializable values with per-entry TTLs, surviving
/// process restarts through the durable tier while bounding memory use.
///
/// The in-memory tier evicts by insertion order, not read recency: a key that
/// is read often but was inserted long ago is not protected from eviction.
/// This is a deliberate simplification; the durable copy is untouched by
/// memory eviction, so an evicted key is still served (more slowly) from the
/// store.
///
/// # Type Parameters
///
/// * `C` - Clock type for time operations (defaults to [`SystemClock`])
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use perkwallet_common::cache::{CacheConfig, PersistentCache};
/// use perkwallet_common::storage::MemoryStore;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = PersistentCache::new(Arc::new(MemoryStore::new()), CacheConfig::default());
///     cache.initialize().await;
///
///     cache.set("balance", &42_u32, None).await;
///     assert_eq!(cache.get::<u32>("balance").await, Some(42));
/// }
/// ```
#[derive(Clone)]
pub struct PersistentCache<C = SystemClock>
where
    C: Clock + Clone,
{
    store: Arc<dyn KeyValueStore>,
    config: Arc<CacheConfig>,
    clock: C,
    memory: Arc<RwLock<MemoryTier>>,
    metadata: Arc<RwLock<CacheMetadata>>,
    metrics: MetricsCollector,
    shutdown: Arc<AtomicBool>,
    cleanup_handle: Arc<StdMutex<Option<JoinHandle<()>>>>,
}

impl PersistentCache<SystemClock> {
    /// Create a cache with the default system clock
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<C> PersistentCache<C>
where
    C: Clock + Clone + 'static,
{
    /// Create a cache with an injected clock
    pub fn with_clock(store: Arc<dyn KeyValueStore>, config: CacheConfig, clock: C) -> Self {
        Self {
            store,
            config: Arc::new(config),
            clock,
            memory: Arc::new(RwLock::new(MemoryTier::default())),
            metadata: Arc::new(RwLock::new(CacheMetadata::default())),
            metrics: MetricsCollector::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            cleanup_handle: Arc::new(StdMutex::new(None)),
        }
    }

    /// Load persisted metadata and start the recurring cleanup task
    ///
    /// The memory tier starts empty and refills lazily as reads promote
    /// durable entries. When no Tokio runtime is active the cleanup task is
    /// skipped with a warning; `cleanup` can still be driven manually.
    pub async fn initialize(&self) {
        match self.store.get(CACHE_METADATA_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<CacheMetadata>(&raw) {
                Ok(loaded) => {
                    info!(entries = loaded.keys.len(), "cache metadata loaded");
                    *self.metadata.write().await = loaded;
                }
                Err(e) => {
                    warn!(error = %e, "corrupt cache metadata, starting with an empty index");
                }
            },
            Ok(None) => debug!("no persisted cache metadata"),
            Err(e) => warn!(error = %e, "failed to load cache metadata"),
        }

        self.start_cleanup_task();
    }

    /// Stop the recurring cleanup task
    pub fn shutdown(&self) {
        self.shutdown.store(true, AtomicOrdering::Relaxed);
        if let Ok(mut slot) = self.cleanup_handle.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
        debug!("cache cleanup task stopped");
    }

    /// Read a value, trying the memory tier before the durable store
    ///
    /// An expired durable entry found here is synchronously reaped (entry and
    /// metadata reference both removed) before `None` is returned. A payload
    /// that does not deserialize to `T` counts as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get_value(key).await?;
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cached payload does not match requested type");
                None
            }
        }
    }

    /// Write a value to both tiers
    ///
    /// `expires_at` is `now + ttl` (the configured default when `ttl` is
    /// `None`). Overwrites any existing entry for the key, last write wins.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, error = %e, "unserializable value, skipping cache write");
                return;
            }
        };

        let now = self.clock.millis_since_epoch();
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        let entry = CacheEntry {
            data,
            timestamp: now,
            expires_at: now.saturating_add(ttl.as_millis() as u64),
            key: key.to_string(),
        };

        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(e) = self.store.set(&self.config.entry_key(key), &json).await {
                    warn!(key, error = %e, "durable cache write failed, memory tier still serves the value");
                }
            }
            Err(e) => warn!(key, error = %e, "failed to serialize cache entry"),
        }

        self.insert_memory(entry).await;

        let added = { self.metadata.write().await.keys.insert(key.to_string()) };
        if added {
            self.persist_metadata().await;
        }

        debug!(key, ttl_ms = ttl.as_millis() as u64, "cache entry written");
    }

    /// Remove a key from both tiers and from the metadata index
    ///
    /// Deleting an absent key is a no-op, not an error.
    pub async fn delete(&self, key: &str) {
        self.memory.write().await.entries.remove(key);
        self.remove_durable(key).await;
        debug!(key, "cache entry deleted");
    }

    /// Drop everything: memory tier, every durable entry, and the metadata
    /// record
    ///
    /// Best-effort delete-all: a single entry's I/O failure is logged and the
    /// remaining entries are still attempted.
    pub async fn clear(&self) {
        self.memory.write().await.entries.clear();

        let keys: Vec<String> = {
            let mut metadata = self.metadata.write().await;
            let keys = metadata.keys.drain().collect();
            *metadata = CacheMetadata::default();
            keys
        };

        for key in &keys {
            if let Err(e) = self.store.remove(&self.config.entry_key(key)).await {
                warn!(key = %key, error = %e, "failed to delete cache entry during clear");
            }
        }

        if let Err(e) = self.store.remove(CACHE_METADATA_KEY).await {
            warn!(error = %e, "failed to delete cache metadata during clear");
        }

        info!(entries = keys.len(), "cache cleared");
    }

    /// Remove every expired durable entry, returning the removal count
    ///
    /// Walks the metadata index rather than scanning the store. Runs on a
    /// recurring timer once `initialize` has been called, so storage does not
    /// grow unbounded even for keys that are never read again. Corrupt
    /// entries are reclaimed the same way as expired ones; a metadata
    /// reference with no durable entry behind it is dropped without counting.
    pub async fn cleanup(&self) -> usize {
        let now = self.clock.millis_since_epoch();
        let keys: Vec<String> = { self.metadata.read().await.keys.iter().cloned().collect() };

        let mut removed = 0usize;
        let mut dropped_keys: Vec<String> = Vec::new();

        for key in keys {
            let storage_key = self.config.entry_key(&key);
            match self.store.get(&storage_key).await {
                Ok(Some(raw)) => match serde_json::from_str::<CacheEntry>(&raw) {
                    Ok(entry) if entry.is_expired(now) => {
                        if let Err(e) = self.store.remove(&storage_key).await {
                            // Keep the metadata reference; the next pass retries.
                            warn!(key = %key, error = %e, "failed to delete expired cache entry");
                            continue;
                        }
                        self.memory.write().await.entries.remove(&key);
                        self.metrics.record_expiration();
                        dropped_keys.push(key);
                        removed += 1;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(key = %key, error = %e, "corrupt cache entry removed during cleanup");
                        if self.store.remove(&storage_key).await.is_ok() {
                            self.memory.write().await.entries.remove(&key);
                            dropped_keys.push(key);
                            removed += 1;
                        }
                    }
                },
                Ok(None) => dropped_keys.push(key),
                Err(e) => {
                    warn!(key = %key, error = %e, "cleanup read failed, keeping entry for next pass");
                }
            }
        }

        {
            let mut metadata = self.metadata.write().await;
            for key in &dropped_keys {
                metadata.keys.remove(key);
            }
            metadata.last_cleanup_at = now;
        }
        self.persist_metadata().await;

        if removed > 0 {
            info!(removed, "cache cleanup removed expired entries");
        }
        removed
    }

    /// Point-in-time statistics snapshot
    ///
    /// Uses a non-blocking read of the memory tier; if the lock is held the
    /// size is reported as 0.
    pub fn stats(&self) -> CacheStats {
        let size = self.memory.try_read().map(|m| m.entries.len()).unwrap_or(0);
        self.metrics.snapshot(size, self.config.max_memory_entries)
    }

    /// Untyped read used by the typed `get`.
    async fn get_value(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.millis_since_epoch();

        // Fast path: unexpired in-memory entry, no I/O.
        {
            let memory = self.memory.read().await;
            if let Some(held) = memory.entries.get(key) {
                if !held.entry.is_expired(now) {
                    self.metrics.record_hit();
                    return Some(held.entry.data.clone());
                }
            }
        }

        // Drop an expired memory copy; the durable tier decides what remains.
        {
            let mut memory = self.memory.write().await;
            let expired =
                memory.entries.get(key).is_some_and(|held| held.entry.is_expired(now));
            if expired {
                memory.entries.remove(key);
            }
        }

        self.get_durable(key, now).await
    }

    /// Durable-tier read with expiry reaping and memory promotion.
    async fn get_durable(&self, key: &str, now: u64) -> Option<serde_json::Value> {
        let storage_key = self.config.entry_key(key);

        let raw = match self.store.get(&storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.metrics.record_miss();
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "durable cache read failed, treating as miss");
                self.metrics.record_miss();
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "corrupt cache entry, treating as miss");
                self.metrics.record_miss();
                return None;
            }
        };

        if entry.is_expired(now) {
            // The one place a stale durable entry is reaped by a read.
            self.remove_durable(key).await;
            self.metrics.record_expiration();
            self.metrics.record_miss();
            return None;
        }

        let data = entry.data.clone();
        self.insert_memory(entry).await;
        self.metrics.record_hit();
        Some(data)
    }

    /// Insert into the memory tier, evicting the oldest-inserted entry when
    /// the tier is full. The evicted key's durable copy is untouched.
    async fn insert_memory(&self, entry: CacheEntry) {
        let mut memory = self.memory.write().await;

        if memory.entries.len() >= self.config.max_memory_entries
            && !memory.entries.contains_key(&entry.key)
        {
            let oldest = memory
                .entries
                .iter()
                .min_by_key(|(_, held)| held.insertion_order)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                memory.entries.remove(&oldest);
                self.metrics.record_eviction();
            }
        }

        let insertion_order = memory.insertion_counter;
        memory.insertion_counter += 1;
        memory.entries.insert(entry.key.clone(), HeldEntry { entry, insertion_order });
        self.metrics.record_insert();
    }

    /// Remove the durable entry and its metadata reference.
    async fn remove_durable(&self, key: &str) {
        if let Err(e) = self.store.remove(&self.config.entry_key(key)).await {
            warn!(key, error = %e, "durable cache delete failed");
        }
        let removed = { self.metadata.write().await.keys.remove(key) };
        if removed {
            self.persist_metadata().await;
        }
    }

    /// Write the metadata record to the store, logging failures.
    async fn persist_metadata(&self) {
        let snapshot = { self.metadata.read().await.clone() };
        match serde_json::to_string(&snapshot) {
            Ok(json) => {
                if let Err(e) = self.store.set(CACHE_METADATA_KEY, &json).await {
                    warn!(error = %e, "failed to persist cache metadata");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize cache metadata"),
        }
    }

    fn start_cleanup_task(&self) {
        match Handle::try_current() {
            Ok(runtime) => {
                let cache = self.clone();
                let interval = self.config.cleanup_interval;
                let shutdown = self.shutdown.clone();

                let handle = runtime.spawn(async move {
                    let mut interval = tokio::time::interval(interval);
                    interval.tick().await;

                    loop {
                        interval.tick().await;

                        if shutdown.load(AtomicOrdering::Relaxed) {
                            break;
                        }

                        let _ = cache.cleanup().await;
                    }
                });

                if let Ok(mut slot) = self.cleanup_handle.lock() {
                    if let Some(old) = slot.replace(handle) {
                        old.abort();
                    }
                }
            }
            Err(_) => {
                warn!("skipping cache cleanup task: no active Tokio runtime detected");
            }
        }
    }
}
