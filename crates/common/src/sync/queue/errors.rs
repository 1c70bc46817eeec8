//! Queue error types

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised by queue internals
///
/// Only construction surfaces these to callers; the operational API logs and
/// degrades instead, because losing a persist must never take the app down.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid queue configuration: {0}")]
    InvalidConfig(String),
}

/// Queue operation result type
pub type QueueResult<T> = Result<T, QueueError>;
