//! Producer error types

use axum::http::StatusCode;
use fleet_broker::BrokerError;
use thiserror::Error;

/// Result type for route sources
pub type RouteResult<T> = std::result::Result<T, RouteError>;

/// Result type for producer operations
pub type Result<T> = std::result::Result<T, ProducerError>;

/// Route source failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouteError {
    /// Upstream failure (bad status, network error, invalid route spec)
    #[error("route unavailable: {0}")]
    Unavailable(String),

    /// The route source found no path
    #[error("route is empty")]
    Empty,
}

impl RouteError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Errors from a route replay
#[derive(Debug, Error)]
pub enum ProducerError {
    /// Route could not be fetched; nothing was published
    #[error(transparent)]
    Route(#[from] RouteError),

    /// Broker refused a publish part way through a replay
    #[error("broker rejected update after {published} published: {source}")]
    BrokerUnavailable {
        published: usize,
        #[source]
        source: BrokerError,
    },

    /// Another replay is still running on this publisher
    #[error("route replay already in progress")]
    ReplayInProgress,

    /// Unexpected failure at a handler boundary
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProducerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Route(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BrokerUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ReplayInProgress => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing summary message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Route(_) => "Error getting route",
            Self::BrokerUnavailable { .. } => "Error publishing location",
            Self::ReplayInProgress => "Route replay already in progress",
            Self::Internal(_) => "Error updating location",
        }
    }

    /// Updates published before the failure, when the replay got that far
    pub fn published(&self) -> Option<usize> {
        match self {
            Self::BrokerUnavailable { published, .. } => Some(*published),
            _ => None,
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
