//! Persisted cache record types
//!
//! Both records are stored as camelCase JSON so the on-disk format matches
//! what earlier versions of the app wrote.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A single cached value with its expiry window
///
/// Created on `set`, read-only afterward, destroyed by expiry reaping or an
/// explicit delete. For positive TTLs `expires_at > timestamp` always holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The cached JSON payload
    pub data: serde_json::Value,
    /// When the entry was written, epoch milliseconds
    pub timestamp: u64,
    /// When the entry stops being served, epoch milliseconds
    pub expires_at: u64,
    /// The caller-facing key (also encoded in the storage key)
    pub key: String,
}

impl CacheEntry {
    /// Whether the entry is past its expiry at the given time
    pub fn is_expired(&self, now_millis: u64) -> bool {
        now_millis >= self.expires_at
    }
}

/// Index of durable cache entries plus cleanup bookkeeping
///
/// `keys` is kept in lock-step with every durable entry write and delete so
/// bulk operations (`clear`, `cleanup`) never need a full store scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    /// Keys of all durable cache entries currently present
    pub keys: HashSet<String>,
    /// When the last cleanup pass ran, epoch milliseconds
    pub last_cleanup_at: u64,
}
