//! Protocol error types
//!
//! Errors that can occur when parsing or validating positions.

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    /// Text is not of the form `lat,lng`
    #[error("invalid coordinate '{text}': {reason}")]
    InvalidCoordinate { text: String, reason: &'static str },

    /// Latitude outside [-90, 90]
    #[error("latitude {0} out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180]
    #[error("longitude {0} out of range [-180, 180]")]
    LongitudeOutOfRange(f64),

    /// NaN or infinite component
    #[error("coordinate component is not finite")]
    NotFinite,
}

impl ProtocolError {
    /// Create an invalid coordinate error
    #[inline]
    pub fn invalid_coordinate(text: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidCoordinate {
            text: text.into(),
            reason,
        }
    }
}
