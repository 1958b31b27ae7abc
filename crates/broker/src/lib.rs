//! Fleet Broker - Topic log between producer and consumer
//!
//! A thin adapter over a durable, ordered, single-partition log. The
//! producer only sees `TopicPublisher::publish`; the consumer side joins a
//! consumer group and reads records in publish order through a
//! `TopicConsumer`.
//!
//! # Architecture
//!
//! ```text
//! Publisher ──publish──→ TopicLog [offset 0, 1, 2, ...] ──watermark──┐
//!                             │                                      ▼
//!                             └── committed offsets per group ←── TopicConsumer (group)
//! ```
//!
//! # Delivery
//!
//! - **Ordered**: offsets are assigned under the log lock, in publish order
//! - **At-least-once**: a consumer resumes from its group's last commit, so
//!   anything read but not committed is delivered again
//! - **Bounded**: the log keeps `retention` records; a consumer that falls
//!   further behind skips forward to the oldest retained record
//!
//! # Example
//!
//! ```ignore
//! let broker = MemoryBroker::new(&BrokerConfig::default());
//! let topic = TopicName::new("fleet-location");
//!
//! let mut consumer = broker.subscribe(&topic, "user-group");
//! broker.publish(&topic, Location::new("12.9,77.6")).await?;
//!
//! let update = consumer.next().await?;
//! consumer.commit(&update);
//! ```

mod consumer;
mod error;
mod memory;
mod metrics;
mod topic;

pub use consumer::TopicConsumer;
pub use error::{BrokerError, Result};
pub use memory::MemoryBroker;
pub use metrics::{BrokerMetrics, BrokerMetricsSnapshot};
pub use topic::{TopicName, TopicPublisher};
