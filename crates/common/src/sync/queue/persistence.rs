//! Durable queue records
//!
//! The whole pending list is persisted as one JSON array under a fixed key,
//! rewritten after every mutation. Queues here are small (tens of entries at
//! the worst), so the rewrite is cheaper than maintaining per-entry records
//! with an index.

use std::sync::Arc;

use tracing::warn;

use super::errors::QueueResult;
use super::types::{QueuedRequest, SyncMetadata};
use crate::storage::KeyValueStore;

/// Storage key for the persisted pending-request list
pub const SYNC_QUEUE_KEY: &str = "sync:queue";

/// Storage key for the persisted sync bookkeeping record
pub const SYNC_METADATA_KEY: &str = "sync:metadata";

/// Reads and writes the queue's durable records
#[derive(Clone)]
pub(crate) struct QueuePersistence {
    store: Arc<dyn KeyValueStore>,
}

impl QueuePersistence {
    pub(crate) fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the pending list persisted by an earlier run
    ///
    /// A corrupt record is logged and replaced by an empty queue rather than
    /// propagated: the alternative is a queue that can never start again.
    pub(crate) async fn load_queue(&self) -> QueueResult<Vec<QueuedRequest>> {
        match self.store.get(SYNC_QUEUE_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(items) => Ok(items),
                Err(e) => {
                    warn!(error = %e, "corrupt persisted queue, starting empty");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    /// Persist the full pending list
    pub(crate) async fn save_queue(&self, items: &[QueuedRequest]) -> QueueResult<()> {
        let json = serde_json::to_string(items)?;
        self.store.set(SYNC_QUEUE_KEY, &json).await?;
        Ok(())
    }

    /// Load the sync bookkeeping record, defaulting when absent or corrupt
    pub(crate) async fn load_metadata(&self) -> QueueResult<SyncMetadata> {
        match self.store.get(SYNC_METADATA_KEY).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(metadata) => Ok(metadata),
                Err(e) => {
                    warn!(error = %e, "corrupt sync metadata, resetting counters");
                    Ok(SyncMetadata::default())
                }
            },
            None => Ok(SyncMetadata::default()),
        }
    }

    /// Persist the sync bookkeeping record
    pub(crate) async fn save_metadata(&self, metadata: &SyncMetadata) -> QueueResult<()> {
        let json = serde_json::to_string(metadata)?;
        self.store.set(SYNC_METADATA_KEY, &json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for sync::queue::persistence.
    use super::*;
    use crate::http::HttpMethod;
    use crate::storage::MemoryStore;

    fn sample_request(id: &str) -> QueuedRequest {
        QueuedRequest {
            id: id.to_string(),
            method: HttpMethod::Post,
            endpoint: "/points/redeem".to_string(),
            body: None,
            headers: None,
            options: None,
            enqueued_at: 1000,
            retry_count: 0,
            max_retries: 3,
        }
    }

    /// Validates `QueuePersistence::save_queue` behavior for the save and
    /// load scenario.
    ///
    /// Assertions:
    /// - Confirms `loaded.len()` equals `2`.
    /// - Confirms order is preserved across the round trip.
    #[tokio::test]
    async fn test_save_and_load_queue() {
        let persistence = QueuePersistence::new(Arc::new(MemoryStore::new()));

        persistence.save_queue(&[sample_request("a"), sample_request("b")]).await.unwrap();

        let loaded = persistence.load_queue().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "a");
        assert_eq!(loaded[1].id, "b");
    }

    /// Validates `QueuePersistence::load_queue` behavior for the missing
    /// record scenario.
    ///
    /// Assertions:
    /// - Ensures `persistence.load_queue().await.unwrap().is_empty()`
    ///   evaluates to true.
    #[tokio::test]
    async fn test_load_queue_absent() {
        let persistence = QueuePersistence::new(Arc::new(MemoryStore::new()));
        assert!(persistence.load_queue().await.unwrap().is_empty());
    }

    /// Validates `QueuePersistence::load_queue` behavior for the corrupt
    /// record scenario.
    ///
    /// Assertions:
    /// - Confirms a corrupt record loads as an empty queue instead of an
    ///   error.
    #[tokio::test]
    async fn test_load_queue_corrupt_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(SYNC_QUEUE_KEY, "{definitely not json").await.unwrap();

        let persistence = QueuePersistence::new(store);
        assert!(persistence.load_queue().await.unwrap().is_empty());
    }

    /// Validates `QueuePersistence::save_metadata` behavior for the metadata
    /// round trip scenario.
    ///
    /// Assertions:
    /// - Confirms `loaded.total_synced` equals `4`.
    /// - Confirms `loaded.last_sync_at` equals `99`.
    #[tokio::test]
    async fn test_metadata_round_trip() {
        let persistence = QueuePersistence::new(Arc::new(MemoryStore::new()));

        let metadata = SyncMetadata { last_sync_at: 99, total_synced: 4, total_failed: 1 };
        persistence.save_metadata(&metadata).await.unwrap();

        let loaded = persistence.load_metadata().await.unwrap();
        assert_eq!(loaded.last_sync_at, 99);
        assert_eq!(loaded.total_synced, 4);
        assert_eq!(loaded.total_failed, 1);
    }
}
