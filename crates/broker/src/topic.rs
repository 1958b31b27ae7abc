//! Topic identification and the producer-facing publish seam

use std::fmt;

use async_trait::async_trait;
use fleet_protocol::Location;

use crate::error::Result;

/// Topic identifier shared by producer and consumer configuration
///
/// # Example
///
/// ```
/// use fleet_broker::TopicName;
///
/// let topic = TopicName::new("fleet-location");
/// assert_eq!(topic.as_str(), "fleet-location");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicName(String);

impl TopicName {
    /// Create a new topic name
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the topic name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TopicName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for TopicName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Publish side of a broker topic
///
/// Implementations must assign offsets in call order and fail fast with
/// `BrokerError::Unavailable` rather than block indefinitely.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Append a location to the topic, returning its offset
    async fn publish(&self, topic: &TopicName, location: Location) -> Result<u64>;
}
