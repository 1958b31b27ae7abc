//! Route replay publisher
//!
//! The publisher fetches a route, then publishes each point to the broker
//! topic with a fixed pause between sends. It owns the producer-side
//! latest-position cell: the cell is updated right after the broker accepts
//! a point, so a reader never sees anything older than the last queued
//! update.
//!
//! # Replay guard
//!
//! Only one replay runs per publisher. A trigger that arrives while a replay
//! is active is rejected with `ProducerError::ReplayInProgress` instead of
//! being queued, so publishes from two replays never interleave.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fleet_broker::{TopicName, TopicPublisher};
use fleet_protocol::{Location, PositionReader, PositionWriter, seeded_position};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ProducerError, Result};
use crate::metrics::{ProducerMetrics, ProducerMetricsSnapshot};
use crate::route::{RouteSource, RouteSpec};

/// Outcome of a completed route replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    /// Updates accepted by the broker
    pub published: usize,
}

/// Paces route points onto a broker topic
pub struct Publisher {
    routes: Arc<dyn RouteSource>,
    broker: Arc<dyn TopicPublisher>,
    topic: TopicName,
    /// Pause between consecutive publishes
    interval: Duration,
    /// Producer-side latest position; only this publisher writes it
    latest: PositionWriter<Location>,
    /// Set while a replay holds the guard
    replaying: AtomicBool,
    metrics: ProducerMetrics,
}

impl Publisher {
    /// Create a publisher whose latest position starts at `seed`
    pub fn new(
        routes: Arc<dyn RouteSource>,
        broker: Arc<dyn TopicPublisher>,
        topic: TopicName,
        interval: Duration,
        seed: Location,
    ) -> Self {
        let (latest, _) = seeded_position(seed);
        Self {
            routes,
            broker,
            topic,
            interval,
            latest,
            replaying: AtomicBool::new(false),
            metrics: ProducerMetrics::new(),
        }
    }

    /// Replay a route onto the topic
    ///
    /// Fetches the route, then publishes every point in order, sleeping
    /// `interval` between sends. Resolves once the last point is published.
    ///
    /// # Errors
    ///
    /// - `ReplayInProgress` if another replay is running; nothing is published
    /// - `Route` if the route cannot be fetched; nothing is published
    /// - `BrokerUnavailable` if a publish fails; the replay stops and the
    ///   error carries how many points made it out
    pub async fn trigger_update(&self, spec: &RouteSpec) -> Result<ReplayReport> {
        let Some(_guard) = ReplayGuard::try_acquire(&self.replaying) else {
            self.metrics.replay_rejected();
            debug!(topic = %self.topic, "replay rejected, another replay is running");
            return Err(ProducerError::ReplayInProgress);
        };
        self.metrics.replay_started();

        let result = self.replay(spec).await;
        match &result {
            Ok(report) => {
                self.metrics.replay_completed();
                info!(topic = %self.topic, published = report.published, "route replay finished");
            }
            Err(e) => {
                self.metrics.replay_failed();
                warn!(topic = %self.topic, error = %e, "route replay aborted");
            }
        }
        result
    }

    /// Run `trigger_update` on its own task
    ///
    /// The replay keeps going even if the caller stops waiting on the handle.
    pub fn spawn_replay(self: &Arc<Self>, spec: RouteSpec) -> JoinHandle<Result<ReplayReport>> {
        let publisher = Arc::clone(self);
        tokio::spawn(async move { publisher.trigger_update(&spec).await })
    }

    async fn replay(&self, spec: &RouteSpec) -> Result<ReplayReport> {
        let points = self.routes.fetch_route(spec).await?;

        info!(
            topic = %self.topic,
            points = points.len(),
            mode = spec.mode.as_str(),
            "route replay started"
        );

        let mut published = 0;
        for (i, point) in points.into_iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.interval).await;
            }

            let location = Location::from(point);
            match self.broker.publish(&self.topic, location.clone()).await {
                Ok(offset) => {
                    self.latest.set(location);
                    self.metrics.update_published();
                    published += 1;
                    debug!(topic = %self.topic, offset, location = %point, "location published");
                }
                Err(source) => {
                    return Err(ProducerError::BrokerUnavailable { published, source });
                }
            }
        }

        Ok(ReplayReport { published })
    }

    /// Most recent published location, or the seed before any publish
    pub fn last_known_position(&self) -> Location {
        // Seeded at construction and never cleared
        self.latest.get().unwrap_or_default()
    }

    /// Read handle on the producer-side latest position
    pub fn position_reader(&self) -> PositionReader<Location> {
        self.latest.reader()
    }

    /// Whether a replay currently holds the guard
    pub fn is_replaying(&self) -> bool {
        self.replaying.load(Ordering::Relaxed)
    }

    /// Topic this publisher writes to
    pub fn topic(&self) -> &TopicName {
        &self.topic
    }

    /// Replay counters
    pub fn metrics(&self) -> ProducerMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("topic", &self.topic)
            .field("interval", &self.interval)
            .field("replaying", &self.is_replaying())
            .finish_non_exhaustive()
    }
}

/// Holds the replay flag until dropped
struct ReplayGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ReplayGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "publisher_test.rs"]
mod tests;
