//! # PerkWallet Common
//!
//! Offline durability layer for the PerkWallet client: a two-tier TTL cache
//! and a durable sync queue, both built over host-supplied seams (storage,
//! HTTP, connectivity, time) so the same logic runs on every platform the
//! app ships on.
//!
//! ## Modules
//!
//! - [`cache`] - Two-tier TTL cache with a persistent mirror
//! - [`sync`] - Offline sync queue for deferred HTTP mutations
//! - [`storage`] - Durable key-value store seam and in-memory implementation
//! - [`http`] - HTTP invoker seam and wire types
//! - [`connectivity`] - Connectivity signal seam
//! - [`time`] - Clock abstraction for deterministic tests
//! - [`testing`] - Mock seams for tests (also exported to host apps)
//!
//! ## Design notes
//!
//! The cache and the queue never propagate storage failures to callers: a
//! lost persist is logged and degraded (cache miss, skipped write), because
//! the durable tier is an optimization over the network, not a source of
//! truth. Everything time-dependent goes through [`time::Clock`] so expiry
//! and retry behavior can be tested without real delays.

pub mod cache;
pub mod connectivity;
pub mod http;
pub mod storage;
pub mod sync;
pub mod testing;
pub mod time;

// Re-export commonly used types at the crate root
pub use cache::{CacheConfig, CacheStats, PersistentCache};
pub use connectivity::{AlwaysOnline, ConnectivityMonitor};
pub use http::{HttpError, HttpInvoker, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};
pub use sync::queue::{QueueConfig, QueueStats, RequestDraft, SyncQueue};
pub use time::{Clock, MockClock, SystemClock};
