//! LiveBroadcaster - fan-out point for consumer-side position updates
//!
//! `LiveBroadcaster` sits between the topic subscriber and connected live
//! listeners. It provides:
//!
//! - Fire-and-forget push to every listener registered at call time
//! - Pull queries answered from a read handle on the consumer-side cache
//! - Automatic cleanup of disconnected listeners
//!
//! # Usage
//!
//! ```ignore
//! let (writer, reader) = latest_position();
//! let broadcaster = Arc::new(LiveBroadcaster::new(reader, &config.consumer));
//!
//! // For new connections:
//! let (id, rx) = broadcaster.register()?;
//!
//! // Pull path:
//! let response = broadcaster.pull();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fleet_config::ConsumerConfig;
use fleet_protocol::{Location, PositionReader};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{Result, TapError};
use crate::listener::{BroadcastReport, ListenerSet};
use crate::pull::PullResponse;

/// Interval for cleanup of disconnected listeners
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5);

/// Push primitive the subscriber forwards updates to
pub trait Fanout: Send + Sync {
    /// Deliver `location` to every current listener
    ///
    /// Fails with `TapError::NoListeners` when nobody is registered. Slow or
    /// disconnected listeners never fail the push.
    fn push(&self, location: &Location) -> Result<BroadcastReport>;
}

/// Live broadcaster for the push channel and pull queries
#[derive(Debug)]
pub struct LiveBroadcaster {
    /// Listener registry
    listeners: ListenerSet,
    /// Read handle on the consumer-side latest position
    latest: PositionReader<Location>,
    /// Total pushes with at least one listener
    push_count: AtomicU64,
    /// Total per-listener deliveries
    sent_count: AtomicU64,
    /// Total per-listener drops (full buffers)
    dropped_count: AtomicU64,
    /// Total pull queries answered
    pull_count: AtomicU64,
}

impl LiveBroadcaster {
    /// Create a broadcaster with limits from configuration
    pub fn new(latest: PositionReader<Location>, config: &ConsumerConfig) -> Self {
        Self::with_listeners(latest, ListenerSet::new(config.max_listeners, config.listener_buffer))
    }

    /// Create a broadcaster around an existing listener set
    pub fn with_listeners(latest: PositionReader<Location>, listeners: ListenerSet) -> Self {
        Self {
            listeners,
            latest,
            push_count: AtomicU64::new(0),
            sent_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            pull_count: AtomicU64::new(0),
        }
    }

    /// Register a live listener
    ///
    /// Returns the listener ID and a receiver for every location pushed
    /// from now on. Nothing pushed earlier is replayed.
    pub fn register(&self) -> Result<(u64, mpsc::Receiver<Location>)> {
        let (id, receiver) = self.listeners.register()?;
        debug!(id, "live listener registered");
        Ok((id, receiver))
    }

    /// Deregister a live listener
    pub fn deregister(&self, id: u64) -> Result<()> {
        self.listeners.deregister(id)?;
        debug!(id, "live listener removed");
        Ok(())
    }

    /// Answer a pull query from the cached latest position
    pub fn pull(&self) -> PullResponse {
        self.pull_count.fetch_add(1, Ordering::Relaxed);
        PullResponse::from_latest(self.latest.get())
    }

    /// Get the number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.count()
    }

    /// Check if there are any listeners
    #[inline]
    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Get broadcaster statistics
    pub fn stats(&self) -> BroadcastStats {
        BroadcastStats {
            push_count: self.push_count.load(Ordering::Relaxed),
            sent_count: self.sent_count.load(Ordering::Relaxed),
            dropped_count: self.dropped_count.load(Ordering::Relaxed),
            pull_count: self.pull_count.load(Ordering::Relaxed),
            listener_count: self.listeners.count(),
        }
    }

    /// Clean up disconnected listeners
    ///
    /// Called periodically by the maintenance task.
    pub fn cleanup(&self) -> usize {
        let removed = self.listeners.cleanup_disconnected();

        if removed > 0 {
            debug!(removed, "cleaned up disconnected listeners");
        }

        removed
    }

    /// Spawn the maintenance task
    ///
    /// Removes disconnected listeners every few seconds until `cancel` fires.
    pub fn spawn_maintenance(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let broadcaster = Arc::clone(self);

        tokio::spawn(async move {
            let mut cleanup_interval = tokio::time::interval(CLEANUP_INTERVAL);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = cleanup_interval.tick() => {
                        broadcaster.cleanup();
                    }
                }
            }
        })
    }
}

impl Fanout for LiveBroadcaster {
    fn push(&self, location: &Location) -> Result<BroadcastReport> {
        let report = self.listeners.broadcast(location);
        if report.offered() == 0 {
            return Err(TapError::NoListeners);
        }

        self.push_count.fetch_add(1, Ordering::Relaxed);
        self.sent_count.fetch_add(report.sent as u64, Ordering::Relaxed);
        self.dropped_count.fetch_add(report.full as u64, Ordering::Relaxed);
        trace!(sent = report.sent, full = report.full, closed = report.closed, "pushed location");

        Ok(report)
    }
}

/// Statistics about the broadcaster
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BroadcastStats {
    /// Pushes that reached the listener set
    pub push_count: u64,
    /// Per-listener deliveries
    pub sent_count: u64,
    /// Per-listener drops
    pub dropped_count: u64,
    /// Pull queries answered
    pub pull_count: u64,
    /// Current number of listeners
    pub listener_count: usize,
}

#[cfg(test)]
#[path = "broadcaster_test.rs"]
mod tests;
