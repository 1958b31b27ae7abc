//! Broker error types

use thiserror::Error;

use crate::topic::TopicName;

/// Broker errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The broker refused or could not accept a publish
    #[error("broker unavailable for topic '{topic}': {reason}")]
    Unavailable { topic: TopicName, reason: String },

    /// The topic log was shut down while a consumer was waiting
    #[error("topic '{0}' is closed")]
    Closed(TopicName),
}

impl BrokerError {
    /// Create an Unavailable error
    pub fn unavailable(topic: &TopicName, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            topic: topic.clone(),
            reason: reason.into(),
        }
    }
}

/// Result type for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;
