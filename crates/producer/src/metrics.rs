//! Producer metrics
//!
//! Lock-free counters for route replays. Relaxed ordering; values are
//! eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Route replay counters
#[derive(Debug, Default)]
pub struct ProducerMetrics {
    /// Replays that acquired the replay guard
    replays_started: AtomicU64,
    /// Replays that published every point
    replays_completed: AtomicU64,
    /// Replays aborted by a route or broker failure
    replays_failed: AtomicU64,
    /// Triggers rejected while another replay was running
    replays_rejected: AtomicU64,
    /// Updates accepted by the broker
    published: AtomicU64,
}

impl ProducerMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            replays_started: AtomicU64::new(0),
            replays_completed: AtomicU64::new(0),
            replays_failed: AtomicU64::new(0),
            replays_rejected: AtomicU64::new(0),
            published: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn replay_started(&self) {
        self.replays_started.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn replay_completed(&self) {
        self.replays_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn replay_failed(&self) {
        self.replays_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn replay_rejected(&self) {
        self.replays_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn update_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> ProducerMetricsSnapshot {
        ProducerMetricsSnapshot {
            replays_started: self.replays_started.load(Ordering::Relaxed),
            replays_completed: self.replays_completed.load(Ordering::Relaxed),
            replays_failed: self.replays_failed.load(Ordering::Relaxed),
            replays_rejected: self.replays_rejected.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of producer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProducerMetricsSnapshot {
    pub replays_started: u64,
    pub replays_completed: u64,
    pub replays_failed: u64,
    pub replays_rejected: u64,
    pub published: u64,
}
