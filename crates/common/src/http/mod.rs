//! HTTP invoker seam
//!
//! The sync queue replays deferred mutations through an [`HttpInvoker`], a
//! thin abstraction over whatever HTTP client the host application uses.
//! Erroring is the sole failure signal: the queue does not distinguish
//! network errors from 4xx or 5xx responses for retry purposes, so invoker
//! implementations should map any non-success outcome to an [`HttpError`].

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP methods accepted by the sync queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Patch => write!(f, "PATCH"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single request handed to the invoker
///
/// `options` is an opaque pass-through for invoker-specific settings
/// (timeouts, auth hints); the queue persists it verbatim and never inspects
/// it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub endpoint: String,
    pub body: Option<serde_json::Value>,
    pub headers: Option<HashMap<String, String>>,
    pub options: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Create a request with no body, headers, or options
    pub fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self { method, endpoint: endpoint.into(), body: None, headers: None, options: None }
    }
}

/// Response returned by a successful invocation
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

/// Invoker failure
///
/// A single variant per failure shape is enough: the queue treats every error
/// identically (one retry attempt consumed).
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// HTTP invoker consumed by the sync queue
///
/// Implemented by the host application over its real HTTP client; tests use
/// [`crate::testing::mocks::MockHttpInvoker`].
#[async_trait]
pub trait HttpInvoker: Send + Sync {
    /// Perform the request, returning an error for any non-success outcome.
    async fn invoke(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError>;
}

#[cfg(test)]
mod tests {
    //! Unit tests for http.
    use super::*;

    /// Validates `HttpMethod` display formatting.
    ///
    /// Assertions:
    /// - Confirms `HttpMethod::Get.to_string()` equals `"GET"`.
    /// - Confirms `HttpMethod::Patch.to_string()` equals `"PATCH"`.
    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
        assert_eq!(HttpMethod::Put.to_string(), "PUT");
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    /// Validates `HttpMethod` serde round trip uses uppercase names.
    ///
    /// Assertions:
    /// - Confirms `serde_json::to_string(&HttpMethod::Post).unwrap()` equals
    ///   `"\"POST\""`.
    /// - Confirms deserializing `"\"DELETE\""` yields `HttpMethod::Delete`.
    #[test]
    fn test_method_serialization() {
        assert_eq!(serde_json::to_string(&HttpMethod::Post).unwrap(), "\"POST\"");

        let method: HttpMethod = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(method, HttpMethod::Delete);
    }

    /// Validates `HttpRequest::new` behavior for the bare request scenario.
    ///
    /// Assertions:
    /// - Confirms `request.endpoint` equals `"/points"`.
    /// - Ensures `request.body.is_none()` evaluates to true.
    /// - Ensures `request.headers.is_none()` evaluates to true.
    #[test]
    fn test_request_new() {
        let request = HttpRequest::new(HttpMethod::Get, "/points");

        assert_eq!(request.endpoint, "/points");
        assert!(request.body.is_none());
        assert!(request.headers.is_none());
        assert!(request.options.is_none());
    }
}
