//! Broker topic configuration
//!
//! Producer and consumer must agree on the topic name; the consumer group
//! decides where committed offsets are tracked.

use serde::Deserialize;

/// Where a consumer group with no committed offset starts reading
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StartOffset {
    /// From the oldest retained record
    Earliest,
    /// Only records published after the group joins (default)
    #[default]
    Latest,
}

/// Broker configuration
///
/// # Example
///
/// ```toml
/// [broker]
/// topic = "fleet-location"    # default
/// group = "user-group"        # default
/// start = "latest"            # default
/// retention = 10000           # default, records kept in the log
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Topic name shared by producer and consumer
    /// Default: "fleet-location"
    pub topic: String,

    /// Consumer group used by the subscriber
    /// Default: "user-group"
    pub group: String,

    /// Start position for a group without a committed offset
    /// Default: latest
    pub start: StartOffset,

    /// Maximum number of records retained in the topic log
    /// Default: 10000
    pub retention: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            topic: "fleet-location".into(),
            group: "user-group".into(),
            start: StartOffset::Latest,
            retention: 10_000,
        }
    }
}
