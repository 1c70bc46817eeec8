//! Queue data types and configuration

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::{HttpMethod, HttpRequest};

/// A mutation waiting in the durable queue
///
/// Persisted as camelCase JSON alongside its siblings in a single queue
/// record, so the format matches what earlier versions of the app wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    /// Unique id assigned at enqueue time
    pub id: String,
    pub method: HttpMethod,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    /// Opaque invoker settings, persisted verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
    /// When the request was enqueued, epoch milliseconds
    pub enqueued_at: u64,
    /// Failed drain attempts so far
    pub retry_count: u32,
    /// Attempts allowed before the request is dropped
    pub max_retries: u32,
}

impl QueuedRequest {
    /// Build the wire request handed to the invoker
    pub fn to_http_request(&self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            endpoint: self.endpoint.clone(),
            body: self.body.clone(),
            headers: self.headers.clone(),
            options: self.options.clone(),
        }
    }
}

/// Caller-supplied description of a mutation to defer
///
/// The queue fills in the id, the enqueue timestamp, and the retry budget
/// (config default unless overridden here).
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub method: HttpMethod,
    pub endpoint: String,
    pub body: Option<serde_json::Value>,
    pub headers: Option<HashMap<String, String>>,
    pub options: Option<serde_json::Value>,
    pub max_retries: Option<u32>,
}

impl RequestDraft {
    /// Create a draft with no body, headers, or overrides
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            headers: None,
            options: None,
            max_retries: None,
        }
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach request headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Attach opaque invoker options
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Override the retry budget for this request only
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// Persisted sync bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// When the last drain finished, epoch milliseconds (0 = never)
    pub last_sync_at: u64,
    /// Requests successfully replayed over the queue's lifetime
    pub total_synced: u64,
    /// Requests dropped after exhausting their retry budget
    pub total_failed: u64,
}

/// Configuration for the sync queue
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Retry budget applied when a draft does not specify one
    pub default_max_retries: u32,

    /// Interval between periodic drain attempts
    pub sync_interval: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { default_max_retries: 3, sync_interval: Duration::from_secs(30) }
    }
}

impl QueueConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.default_max_retries == 0 {
            return Err("default_max_retries must be greater than 0".to_string());
        }
        if self.sync_interval.is_zero() {
            return Err("sync_interval must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Point-in-time queue statistics
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    /// Requests currently waiting to be replayed
    pub pending: usize,
    /// Whether a drain is in flight right now
    pub is_syncing: bool,
    /// Current connectivity state
    pub is_online: bool,
    /// When the last drain finished, epoch milliseconds (0 = never)
    pub last_sync_at: u64,
    /// Requests successfully replayed over the queue's lifetime
    pub total_synced: u64,
    /// Requests dropped after exhausting their retry budget
    pub total_failed: u64,
}
