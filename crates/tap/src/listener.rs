//! Live listener management
//!
//! Each connected push-channel client gets a `Listener` holding the sending
//! half of a bounded channel. The `ListenerSet` handles registration,
//! removal, and fan-out.
//!
//! Fan-out snapshots the current listeners under the read lock and sends
//! outside it, so a connect or disconnect never waits on a broadcast.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use fleet_protocol::Location;

use crate::error::{Result, TapError};

/// Counter for generating unique listener IDs
static LISTENER_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Default maximum number of concurrent listeners
pub const DEFAULT_MAX_LISTENERS: usize = 100;

/// Default per-listener channel buffer
pub const DEFAULT_LISTENER_BUFFER: usize = 256;

/// A single live listener (connected client)
#[derive(Debug)]
pub struct Listener {
    /// Unique identifier
    id: u64,
    /// Channel sender for location delivery
    sender: mpsc::Sender<Location>,
    /// Updates dropped because the listener's buffer was full
    dropped: AtomicU64,
}

impl Listener {
    fn new(sender: mpsc::Sender<Location>) -> Self {
        Self {
            id: LISTENER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            sender,
            dropped: AtomicU64::new(0),
        }
    }

    /// Get the listener ID
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Updates dropped for this listener
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Try to hand a location to this listener without waiting
    pub fn try_send(&self, location: Location) -> Delivery {
        match self.sender.try_send(location) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Delivery::Full
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Check if this listener is still connected
    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// Result of offering one update to one listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Listener is too slow; update dropped for it only
    Full,
    /// Listener went away
    Closed,
}

/// Per-push delivery counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Listeners that accepted the update
    pub sent: usize,
    /// Listeners skipped because their buffer was full
    pub full: usize,
    /// Listeners found disconnected
    pub closed: usize,
}

impl BroadcastReport {
    /// Listeners the update was offered to
    pub fn offered(&self) -> usize {
        self.sent + self.full + self.closed
    }
}

/// Manages all live listeners
#[derive(Debug)]
pub struct ListenerSet {
    /// Active listeners
    listeners: RwLock<Vec<Arc<Listener>>>,
    /// Registration cap
    max_listeners: usize,
    /// Per-listener channel capacity
    buffer: usize,
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LISTENERS, DEFAULT_LISTENER_BUFFER)
    }
}

impl ListenerSet {
    /// Create a listener set
    pub fn new(max_listeners: usize, buffer: usize) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            max_listeners,
            buffer: buffer.max(1),
        }
    }

    /// Register a new listener
    ///
    /// Returns the listener ID and receiver channel
    pub fn register(&self) -> Result<(u64, mpsc::Receiver<Location>)> {
        let mut listeners = self.listeners.write();

        if listeners.len() >= self.max_listeners {
            return Err(TapError::MaxListeners {
                max: self.max_listeners,
            });
        }

        let (sender, receiver) = mpsc::channel(self.buffer);
        let listener = Arc::new(Listener::new(sender));
        let id = listener.id();
        listeners.push(listener);

        Ok((id, receiver))
    }

    /// Deregister by ID
    pub fn deregister(&self, id: u64) -> Result<()> {
        let mut listeners = self.listeners.write();
        let original_len = listeners.len();
        listeners.retain(|l| l.id() != id);

        if listeners.len() == original_len {
            return Err(TapError::ListenerNotFound { id });
        }

        Ok(())
    }

    /// Get number of registered listeners
    pub fn count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Check if nobody is registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Offer a location to every listener registered right now
    pub fn broadcast(&self, location: &Location) -> BroadcastReport {
        let snapshot: Vec<Arc<Listener>> = self.listeners.read().clone();
        let mut report = BroadcastReport::default();

        for listener in &snapshot {
            match listener.try_send(location.clone()) {
                Delivery::Sent => report.sent += 1,
                Delivery::Full => {
                    report.full += 1;
                    debug!(listener_id = listener.id(), "listener buffer full, update dropped");
                }
                Delivery::Closed => report.closed += 1,
            }
        }

        report
    }

    /// Clean up disconnected listeners
    pub fn cleanup_disconnected(&self) -> usize {
        let mut listeners = self.listeners.write();
        let original_len = listeners.len();
        listeners.retain(|l| l.is_connected());
        original_len - listeners.len()
    }
}

#[cfg(test)]
#[path = "listener_test.rs"]
mod tests;
