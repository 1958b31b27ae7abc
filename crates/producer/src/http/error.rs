//! Producer HTTP errors and error payloads

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ProducerError;

/// Failures starting or running the producer HTTP server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Configured CORS origin is not a valid header value
    #[error("invalid CORS origin '{0}'")]
    InvalidOrigin(String),

    /// Hyper/HTTP error
    #[error("HTTP error: {0}")]
    Http(String),
}

/// JSON body for a failed replay trigger
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&ProducerError> for ErrorBody {
    fn from(err: &ProducerError) -> Self {
        let error = match err {
            ProducerError::ReplayInProgress => None,
            ProducerError::Route(e) => Some(e.to_string()),
            ProducerError::BrokerUnavailable { source, .. } => Some(source.to_string()),
            ProducerError::Internal(msg) => Some(msg.clone()),
        };
        Self {
            message: err.message(),
            published: err.published(),
            error,
        }
    }
}

impl IntoResponse for ProducerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::from(&self))).into_response()
    }
}
