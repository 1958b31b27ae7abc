//! In-process topic log
//!
//! `MemoryBroker` keeps one append-only log per topic. Topics are created on
//! first use, the way an auto-creating broker would. Offsets are assigned
//! under the log mutex, which is held only for the append itself; consumers
//! are woken through a `watch` channel carrying the next offset to be written.
//!
//! A closed topic rejects publishes. Its consumers drain what is already
//! retained and then get `BrokerError::Closed`.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use fleet_config::{BrokerConfig, StartOffset};
use fleet_protocol::{Location, PositionUpdate};

use crate::consumer::TopicConsumer;
use crate::error::{BrokerError, Result};
use crate::metrics::{BrokerMetrics, BrokerMetricsSnapshot};
use crate::topic::{TopicName, TopicPublisher};

/// In-memory broker with per-topic ordered logs and consumer groups
#[derive(Debug)]
pub struct MemoryBroker {
    /// Topic logs by name
    topics: RwLock<HashMap<TopicName, Arc<TopicLog>>>,
    /// Records kept per topic
    retention: usize,
    /// Start position for groups without a commit
    start: StartOffset,
    /// When false, every publish fails with `Unavailable`
    available: AtomicBool,
    /// Shared counters
    metrics: Arc<BrokerMetrics>,
}

impl MemoryBroker {
    /// Create a broker from configuration
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            retention: config.retention.max(1),
            start: config.start,
            available: AtomicBool::new(true),
            metrics: Arc::new(BrokerMetrics::new()),
        }
    }

    /// Join `group` on `topic`
    ///
    /// The consumer resumes after the group's last committed offset. A group
    /// with no commit starts according to the configured `StartOffset`.
    pub fn subscribe(&self, topic: &TopicName, group: &str) -> TopicConsumer {
        let log = self.topic(topic);
        let position = log
            .committed(group)
            .unwrap_or_else(|| match self.start {
                StartOffset::Earliest => log.earliest_offset(),
                StartOffset::Latest => log.next_offset(),
            });

        debug!(topic = %topic, group, position, "consumer joined topic");

        TopicConsumer::new(log, group.to_string(), position)
    }

    /// Simulate the broker going down (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Whether publishes are currently accepted
    #[inline]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Close a topic
    ///
    /// Returns `false` if the topic does not exist or was already closed.
    pub fn close_topic(&self, topic: &TopicName) -> bool {
        match self.topics.read().get(topic) {
            Some(log) => log.close(),
            None => false,
        }
    }

    /// Retained records of a topic, oldest first
    pub fn records(&self, topic: &TopicName) -> Vec<PositionUpdate> {
        match self.topics.read().get(topic) {
            Some(log) => log.inner.lock().records.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Last committed position of `group` on `topic`
    pub fn committed_offset(&self, topic: &TopicName, group: &str) -> Option<u64> {
        self.topics.read().get(topic)?.committed(group)
    }

    /// Broker counters
    pub fn metrics(&self) -> BrokerMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Get or create the log for a topic
    fn topic(&self, topic: &TopicName) -> Arc<TopicLog> {
        if let Some(log) = self.topics.read().get(topic) {
            return Arc::clone(log);
        }

        let mut topics = self.topics.write();
        let log = topics.entry(topic.clone()).or_insert_with(|| {
            debug!(topic = %topic, "creating topic");
            Arc::new(TopicLog::new(topic.clone(), Arc::clone(&self.metrics)))
        });
        Arc::clone(log)
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(&BrokerConfig::default())
    }
}

#[async_trait]
impl TopicPublisher for MemoryBroker {
    async fn publish(&self, topic: &TopicName, location: Location) -> Result<u64> {
        if !self.is_available() {
            self.metrics.record_rejected();
            return Err(BrokerError::unavailable(topic, "broker is not accepting writes"));
        }

        let log = self.topic(topic);
        if log.is_closed() {
            self.metrics.record_rejected();
            return Err(BrokerError::unavailable(topic, "topic is closed"));
        }

        let offset = log.append(location, self.retention);
        trace!(topic = %topic, offset, "record appended");
        Ok(offset)
    }
}

/// Append-only log of a single topic partition
#[derive(Debug)]
pub(crate) struct TopicLog {
    name: TopicName,
    inner: Mutex<LogInner>,
    /// Next offset to be written; consumers wait on changes
    watermark: watch::Sender<u64>,
    closed: AtomicBool,
    metrics: Arc<BrokerMetrics>,
}

#[derive(Debug, Default)]
struct LogInner {
    /// Retained records, oldest first, with contiguous offsets
    records: VecDeque<PositionUpdate>,
    /// Offset the next append receives
    next_offset: u64,
    /// Next offset to deliver, per consumer group
    committed: HashMap<String, u64>,
}

/// Outcome of reading a position from the log
#[derive(Debug)]
pub(crate) enum ReadOutcome {
    /// Record at the requested position
    Record(PositionUpdate),
    /// Position fell out of retention; oldest retained offset given
    Evicted { earliest: u64 },
    /// Nothing written at this position yet
    Pending,
}

impl TopicLog {
    fn new(name: TopicName, metrics: Arc<BrokerMetrics>) -> Self {
        let (watermark, _) = watch::channel(0);
        Self {
            name,
            inner: Mutex::new(LogInner::default()),
            watermark,
            closed: AtomicBool::new(false),
            metrics,
        }
    }

    /// Topic this log belongs to
    #[inline]
    pub(crate) fn name(&self) -> &TopicName {
        &self.name
    }

    /// Shared broker counters
    #[inline]
    pub(crate) fn metrics(&self) -> &BrokerMetrics {
        &self.metrics
    }

    fn append(&self, location: Location, retention: usize) -> u64 {
        let (offset, next) = {
            let mut inner = self.inner.lock();
            let offset = inner.next_offset;
            inner.records.push_back(PositionUpdate::new(offset, location));
            inner.next_offset += 1;

            let excess = inner.records.len().saturating_sub(retention);
            if excess > 0 {
                inner.records.drain(..excess);
                self.metrics.record_evicted(excess as u64);
            }

            (offset, inner.next_offset)
        };

        self.metrics.record_published();
        self.watermark.send_replace(next);
        offset
    }

    /// Mark the log closed and wake every waiting consumer
    fn close(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        // Flag first: a consumer that missed it is still woken by the send
        self.watermark.send_modify(|_| {});
        debug!(topic = %self.name, "topic closed");
        true
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub(crate) fn read(&self, position: u64) -> ReadOutcome {
        let inner = self.inner.lock();
        let earliest = inner.next_offset - inner.records.len() as u64;

        if position >= inner.next_offset {
            return ReadOutcome::Pending;
        }
        if position < earliest {
            return ReadOutcome::Evicted { earliest };
        }

        match inner.records.get((position - earliest) as usize) {
            Some(record) => ReadOutcome::Record(record.clone()),
            None => {
                warn!(topic = %self.name, position, "retained log has a gap");
                ReadOutcome::Evicted { earliest }
            }
        }
    }

    /// Record that `group` has processed everything before `next`
    ///
    /// Commits never move a group backwards.
    pub(crate) fn commit(&self, group: &str, next: u64) {
        let mut inner = self.inner.lock();
        let entry = inner.committed.entry(group.to_string()).or_insert(0);
        if next > *entry {
            *entry = next;
            self.metrics.record_commit();
        }
    }

    pub(crate) fn committed(&self, group: &str) -> Option<u64> {
        self.inner.lock().committed.get(group).copied()
    }

    pub(crate) fn earliest_offset(&self) -> u64 {
        let inner = self.inner.lock();
        inner.next_offset - inner.records.len() as u64
    }

    pub(crate) fn next_offset(&self) -> u64 {
        self.inner.lock().next_offset
    }

    pub(crate) fn watch(&self) -> watch::Receiver<u64> {
        self.watermark.subscribe()
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
