//! Offline sync queue
//!
//! Persistent FIFO queue for HTTP mutations issued while offline. Entries
//! survive restarts, replay strictly in enqueue order, and carry individual
//! retry budgets so one dead endpoint cannot wedge the queue forever.
//!
//! # Features
//!
//! - **Durable**: the pending list is persisted after every mutation
//! - **FIFO replay**: requests go out in the order they were deferred
//! - **Retry budgets**: per-request attempt limits with a config default
//! - **Single-flight draining**: overlapping triggers collapse to one pass
//! - **Automatic triggers**: enqueue-while-online, connectivity restoration,
//!   and a periodic timer
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use perkwallet_common::connectivity::AlwaysOnline;
//! use perkwallet_common::http::{HttpError, HttpInvoker, HttpMethod, HttpRequest, HttpResponse};
//! use perkwallet_common::storage::MemoryStore;
//! use perkwallet_common::sync::queue::{QueueConfig, RequestDraft, SyncQueue};
//!
//! struct NullInvoker;
//!
//! #[async_trait::async_trait]
//! impl HttpInvoker for NullInvoker {
//!     async fn invoke(&self, _request: &HttpRequest) -> Result<HttpResponse, HttpError> {
//!         Ok(HttpResponse { status: 200, body: None })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let queue = SyncQueue::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(NullInvoker),
//!         Arc::new(AlwaysOnline::new()),
//!         QueueConfig::default(),
//!     )
//!     .unwrap();
//!     queue.initialize().await;
//!
//!     queue.enqueue(RequestDraft::new(HttpMethod::Post, "/points/redeem")).await;
//!     queue.sync().await;
//!
//!     queue.shutdown().await;
//! }
//! ```

mod core;
mod errors;
mod persistence;
mod types;

// Re-export public API
pub use core::SyncQueue;
pub use errors::{QueueError, QueueResult};
pub use persistence::{SYNC_METADATA_KEY, SYNC_QUEUE_KEY};
pub use types::{QueueConfig, QueueStats, QueuedRequest, RequestDraft, SyncMetadata};
