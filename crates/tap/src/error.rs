//! Error types for the tap crate

use std::io;

use fleet_broker::BrokerError;
use thiserror::Error;

/// Errors from the consumer side of the relay
#[derive(Error, Debug)]
pub enum TapError {
    /// I/O error (socket operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to bind a listening socket
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Maximum live listeners reached
    #[error("maximum listeners reached ({max})")]
    MaxListeners { max: usize },

    /// Listener not found
    #[error("listener not found: {id}")]
    ListenerNotFound { id: u64 },

    /// Push with nobody registered
    #[error("no live listeners registered")]
    NoListeners,

    /// Broker delivery failed
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Hyper/HTTP error
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Result type for tap operations
pub type Result<T> = std::result::Result<T, TapError>;
