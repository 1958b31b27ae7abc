//! Consumer-group reader for a topic log

use std::sync::Arc;

use tokio::sync::watch;
use tracing::warn;

use fleet_protocol::PositionUpdate;

use crate::error::{BrokerError, Result};
use crate::memory::{ReadOutcome, TopicLog};
use crate::topic::TopicName;

/// Reads one topic on behalf of a consumer group
///
/// Records come back strictly in offset order. Reading advances only this
/// consumer's position; call `commit` once a record has been handled so a
/// replacement consumer for the same group does not see it again.
#[derive(Debug)]
pub struct TopicConsumer {
    log: Arc<TopicLog>,
    group: String,
    /// Next offset this consumer will return
    position: u64,
    watermark: watch::Receiver<u64>,
}

impl TopicConsumer {
    pub(crate) fn new(log: Arc<TopicLog>, group: String, position: u64) -> Self {
        let watermark = log.watch();
        Self {
            log,
            group,
            position,
            watermark,
        }
    }

    /// Wait for the next record
    ///
    /// Cancel-safe: dropping the future before it resolves does not skip a
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::Closed` once the topic is closed and every
    /// retained record past this consumer's position has been returned.
    pub async fn next(&mut self) -> Result<PositionUpdate> {
        loop {
            let high = *self.watermark.borrow_and_update();
            if self.position < high
                && let Some(update) = self.read_current()
            {
                return Ok(update);
            }

            if self.log.is_closed() {
                return Err(BrokerError::Closed(self.log.name().clone()));
            }

            if self.watermark.changed().await.is_err() {
                return Err(BrokerError::Closed(self.log.name().clone()));
            }
        }
    }

    /// Return the next record if one is already available
    pub fn try_next(&mut self) -> Option<PositionUpdate> {
        self.read_current()
    }

    /// Mark `update` and everything before it as processed for this group
    pub fn commit(&self, update: &PositionUpdate) {
        self.log.commit(&self.group, update.offset + 1);
    }

    /// Topic being consumed
    pub fn topic(&self) -> &TopicName {
        self.log.name()
    }

    /// Consumer group name
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Next offset this consumer will read
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Records written but not yet read by this consumer
    pub fn lag(&self) -> u64 {
        self.log.next_offset().saturating_sub(self.position)
    }

    fn read_current(&mut self) -> Option<PositionUpdate> {
        loop {
            match self.log.read(self.position) {
                ReadOutcome::Record(update) => {
                    self.position = update.offset + 1;
                    self.log.metrics().record_delivered();
                    return Some(update);
                }
                ReadOutcome::Evicted { earliest } => {
                    warn!(
                        topic = %self.log.name(),
                        group = %self.group,
                        skipped = earliest - self.position,
                        "consumer fell behind retention, skipping forward"
                    );
                    self.position = earliest;
                }
                ReadOutcome::Pending => return None,
            }
        }
    }
}

#[cfg(test)]
#[path = "consumer_test.rs"]
mod tests;
