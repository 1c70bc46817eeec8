//! Durable key-value store seam
//!
//! The cache and the sync queue treat durable storage as a black box: a plain
//! string key-value store with no transactions and no atomic multi-key
//! operations. The host application supplies the real backend; this module
//! defines the trait and ships [`MemoryStore`], an in-process implementation
//! used by tests and demos.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by a durable store backend
///
/// Store failures are an optimization loss, not a correctness problem: callers
/// inside this crate log them and degrade to a cache miss or a skipped
/// persist, never propagating them to UI code.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage operation result type
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable key-value store consumed by the cache and the sync queue
///
/// Values are pre-serialized JSON strings. Implementations must provide at
/// most atomic single-key writes; nothing in this crate assumes more.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write `value` under `key`, overwriting any existing value.
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove the value stored under `key`. Removing an absent key is a no-op.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// In-process key-value store backed by a `HashMap`
///
/// Suitable for tests and for running the durability layer without a platform
/// storage backend. Not durable across process restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.lock().map(|data| data.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a key is present, without going through the async trait
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().map(|data| data.contains_key(key)).unwrap_or(false)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let data = self.data.lock().map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut data = self.data.lock().map_err(|e| StorageError::Backend(e.to_string()))?;
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut data = self.data.lock().map_err(|e| StorageError::Backend(e.to_string()))?;
        data.remove(key);
        Ok(())
    }
}
