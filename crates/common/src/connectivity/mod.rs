//! Connectivity signal seam
//!
//! The sync queue drains on connectivity transitions, but the actual signal
//! comes from the platform. [`ConnectivityMonitor`] is the capability
//! interface; the host wires in a real implementation at construction time.
//! When no signal is available, [`AlwaysOnline`] degrades the queue to pure
//! timer-driven draining: every drain is attempted and simply fails fast on
//! each request if the device is actually offline. The implementation is
//! chosen up front, never probed at runtime.

use tokio::sync::watch;

/// Connectivity state provider consumed by the sync queue
pub trait ConnectivityMonitor: Send + Sync {
    /// Current online/offline state
    fn is_connected(&self) -> bool;

    /// Subscribe to state changes
    ///
    /// The receiver yields the new state on every transition; the queue
    /// watches for offline-to-online edges to trigger a drain.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Always-optimistic monitor for hosts without a connectivity signal
///
/// Reports connected forever and never notifies. The queue still converges
/// through its periodic drain timer.
#[derive(Debug)]
pub struct AlwaysOnline {
    sender: watch::Sender<bool>,
}

impl AlwaysOnline {
    /// Create a monitor that always reports connected
    pub fn new() -> Self {
        let (sender, _) = watch::channel(true);
        Self { sender }
    }
}

impl Default for AlwaysOnline {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityMonitor for AlwaysOnline {
    fn is_connected(&self) -> bool {
        true
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}
