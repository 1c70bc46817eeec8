//! Mock implementations of the host-supplied seams
//!
//! Deterministic stand-ins for the HTTP invoker, the connectivity signal, and
//! a fault-injecting store wrapper. Used by unit and integration tests across
//! the crate; exported so host applications can reuse them in their own
//! tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::connectivity::ConnectivityMonitor;
use crate::http::{HttpError, HttpInvoker, HttpRequest, HttpResponse};
use crate::storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};

/// Scriptable HTTP invoker that records every request it sees
///
/// Succeeds with a 200 response by default. Failures can be injected globally
/// (`set_failing`) or per endpoint (`fail_endpoint`).
#[derive(Debug, Default)]
pub struct MockHttpInvoker {
    fail_all: AtomicBool,
    failing_endpoints: Mutex<HashSet<String>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpInvoker {
    /// Create an invoker that succeeds for every request
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent request fail (or succeed again with `false`)
    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    /// Make requests to one endpoint fail while others succeed
    pub fn fail_endpoint(&self, endpoint: &str) {
        // Test utility: panic on poisoned mutex to fail tests early
        self.failing_endpoints.lock().expect("mutex poisoned").insert(endpoint.to_string());
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        // Test utility: panic on poisoned mutex to fail tests early
        self.requests.lock().expect("mutex poisoned").len()
    }

    /// Endpoints of every received request, in arrival order
    pub fn recorded_endpoints(&self) -> Vec<String> {
        // Test utility: panic on poisoned mutex to fail tests early
        self.requests
            .lock()
            .expect("mutex poisoned")
            .iter()
            .map(|request| request.endpoint.clone())
            .collect()
    }

    /// Full copies of every received request, in arrival order
    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        // Test utility: panic on poisoned mutex to fail tests early
        self.requests.lock().expect("mutex poisoned").clone()
    }
}

#[async_trait]
impl HttpInvoker for MockHttpInvoker {
    async fn invoke(&self, request: &HttpRequest) -> Result<HttpResponse, HttpError> {
        // Test utility: panic on poisoned mutex to fail tests early
        self.requests.lock().expect("mutex poisoned").push(request.clone());

        let endpoint_fails = self
            .failing_endpoints
            .lock()
            .expect("mutex poisoned")
            .contains(&request.endpoint);

        if self.fail_all.load(Ordering::SeqCst) || endpoint_fails {
            return Err(HttpError::Request(format!("injected failure for {}", request.endpoint)));
        }

        Ok(HttpResponse { status: 200, body: None })
    }
}

/// Connectivity monitor controlled by the test
///
/// `set_connected` flips the state and notifies subscribers, so tests can
/// exercise offline-to-online transitions deterministically.
#[derive(Debug)]
pub struct MockConnectivity {
    sender: watch::Sender<bool>,
}

impl MockConnectivity {
    /// Create a monitor with the given initial state
    pub fn new(connected: bool) -> Self {
        let (sender, _) = watch::channel(connected);
        Self { sender }
    }

    /// Change the connectivity state, notifying subscribers on transitions
    pub fn set_connected(&self, connected: bool) {
        self.sender.send_replace(connected);
    }
}

impl ConnectivityMonitor for MockConnectivity {
    fn is_connected(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// Store wrapper that injects read or write failures on demand
///
/// Delegates to an inner [`MemoryStore`] until a failure mode is switched on.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStore {
    /// Create a store with no failures armed
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm or disarm read failures
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Arm or disarm write failures (`set` and `remove`)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Whether a key is present in the inner store
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected read failure".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected write failure".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("injected write failure".to_string()));
        }
        self.inner.remove(key).await
    }
}
