//! Synchronization primitives for offline-first operation

pub mod queue;

pub use queue::{QueueConfig, QueueStats, QueuedRequest, RequestDraft, SyncQueue};
