//! Two-tier TTL cache with a persistent mirror
//!
//! A bounded in-memory map backed by the durable key-value store. Values
//! survive process restarts; expiry is enforced on read and by a recurring
//! cleanup pass driven off a metadata index, so bulk operations never scan
//! the whole store.
//!
//! # Features
//!
//! - **Two tiers**: memory-first reads, durable fall-through with promotion
//! - **TTL expiration**: per-entry expiry with a configurable default
//! - **Bounded memory**: insertion-order eviction of the memory tier only
//! - **Never throws**: store failures degrade to cache misses (logged)
//! - **Testable**: injected clock for deterministic expiry tests
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use perkwallet_common::cache::{CacheConfig, PersistentCache};
//! use perkwallet_common::storage::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = PersistentCache::new(Arc::new(MemoryStore::new()), CacheConfig::default());
//!     cache.initialize().await;
//!
//!     cache.set("offers", &vec!["2-for-1"], Some(Duration::from_secs(60))).await;
//!     let offers: Option<Vec<String>> = cache.get("offers").await;
//!     assert!(offers.is_some());
//!
//!     cache.shutdown();
//! }
//! ```

mod config;
mod core;
mod entry;
mod stats;

// Re-export public API
pub use config::{CacheConfig, CacheConfigBuilder, CACHE_ENTRY_PREFIX, CACHE_METADATA_KEY};
pub use core::PersistentCache;
pub use entry::{CacheEntry, CacheMetadata};
pub use stats::CacheStats;
