//! Topic subscriber and consumer-side cache
//!
//! `LocationSubscriber` owns the only writer of the consumer-side latest
//! position. For every record delivered by the broker it overwrites the
//! cache, then forwards the raw location to the broadcaster. Push failures
//! are logged and dropped; the cache update stands.
//!
//! Delivery is at-least-once, so the subscriber remembers the last offset it
//! applied and ignores anything at or below it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fleet_broker::{BrokerError, TopicConsumer};
use fleet_protocol::{Location, PositionUpdate, PositionWriter};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::broadcaster::Fanout;
use crate::error::{Result, TapError};

/// What `on_message` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Cache updated and pushed
    Updated,
    /// Offset already applied; nothing changed
    Duplicate,
}

/// Consumes the position topic into the consumer-side cache
pub struct LocationSubscriber {
    latest: PositionWriter<Location>,
    fanout: Arc<dyn Fanout>,
    /// Highest offset applied so far
    last_offset: Option<u64>,
    metrics: Arc<SubscriberMetrics>,
}

impl LocationSubscriber {
    /// Create a subscriber writing to `latest` and pushing through `fanout`
    pub fn new(latest: PositionWriter<Location>, fanout: Arc<dyn Fanout>) -> Self {
        Self {
            latest,
            fanout,
            last_offset: None,
            metrics: Arc::new(SubscriberMetrics::default()),
        }
    }

    /// Handle one delivered record
    pub fn on_message(&mut self, update: &PositionUpdate) -> Applied {
        if self.last_offset.is_some_and(|last| update.offset <= last) {
            self.metrics.duplicates.fetch_add(1, Ordering::Relaxed);
            debug!(offset = update.offset, "duplicate delivery ignored");
            return Applied::Duplicate;
        }

        self.latest.set(update.location.clone());
        self.last_offset = Some(update.offset);
        self.metrics.applied.fetch_add(1, Ordering::Relaxed);

        match self.fanout.push(&update.location) {
            Ok(report) => {
                trace!(offset = update.offset, sent = report.sent, "location forwarded");
            }
            Err(TapError::NoListeners) => {
                self.metrics.push_failures.fetch_add(1, Ordering::Relaxed);
                debug!(offset = update.offset, "no live listeners for update");
            }
            Err(e) => {
                self.metrics.push_failures.fetch_add(1, Ordering::Relaxed);
                warn!(offset = update.offset, error = %e, "failed to push location update");
            }
        }

        Applied::Updated
    }

    /// Consume `consumer` until cancelled
    ///
    /// Each record is applied, then committed for the consumer's group.
    ///
    /// # Errors
    ///
    /// Returns `TapError::Broker` if the topic is closed underneath the
    /// consumer.
    pub async fn run(mut self, mut consumer: TopicConsumer, cancel: CancellationToken) -> Result<()> {
        info!(
            topic = %consumer.topic(),
            group = consumer.group(),
            position = consumer.position(),
            "location subscriber started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                next = consumer.next() => match next {
                    Ok(update) => {
                        self.on_message(&update);
                        consumer.commit(&update);
                    }
                    Err(e @ BrokerError::Closed(_)) => return Err(e.into()),
                    Err(e) => {
                        warn!(error = %e, "delivery failed, message lost");
                    }
                },
            }
        }

        info!(topic = %consumer.topic(), "location subscriber stopped");
        Ok(())
    }

    /// Highest offset applied so far
    pub fn last_offset(&self) -> Option<u64> {
        self.last_offset
    }

    /// Shared counters, readable while `run` owns the subscriber
    pub fn metrics(&self) -> Arc<SubscriberMetrics> {
        Arc::clone(&self.metrics)
    }
}

/// Subscriber counters
#[derive(Debug, Default)]
pub struct SubscriberMetrics {
    applied: AtomicU64,
    duplicates: AtomicU64,
    push_failures: AtomicU64,
}

impl SubscriberMetrics {
    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> SubscriberMetricsSnapshot {
        SubscriberMetricsSnapshot {
            applied: self.applied.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            push_failures: self.push_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of subscriber counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubscriberMetricsSnapshot {
    /// Records written to the cache
    pub applied: u64,
    /// Redelivered records ignored
    pub duplicates: u64,
    /// Pushes that failed after the cache was updated
    pub push_failures: u64,
}

#[cfg(test)]
#[path = "subscriber_test.rs"]
mod tests;
