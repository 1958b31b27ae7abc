//! Consumer-side pull payloads

use fleet_protocol::Location;
use serde::Serialize;
use tracing::error;

/// Error text when nothing has been delivered yet
pub const NO_DATA_YET: &str = "No location data available yet";

/// Error text for unexpected failures while answering a pull
pub const PROCESSING_FAILED: &str = "Failed to process location update";

/// Pre-rendered `PROCESSING_FAILED` payload, used when encoding itself fails
const PROCESSING_FAILED_JSON: &str = r#"{"error":"Failed to process location update"}"#;

/// Answer to a pull query
///
/// Serializes as `{"location": "<lat,lng>"}` or `{"error": "<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PullResponse {
    Location { location: Location },
    Error { error: String },
}

impl PullResponse {
    /// Current location payload
    pub fn location(location: Location) -> Self {
        Self::Location { location }
    }

    /// Nothing delivered yet
    pub fn no_data_yet() -> Self {
        Self::Error {
            error: NO_DATA_YET.to_string(),
        }
    }

    /// Unexpected failure
    pub fn failed() -> Self {
        Self::Error {
            error: PROCESSING_FAILED.to_string(),
        }
    }

    /// Build from the cached value, if any
    pub fn from_latest(latest: Option<Location>) -> Self {
        latest.map_or_else(Self::no_data_yet, Self::location)
    }

    /// Whether this carries a location
    #[inline]
    pub fn is_location(&self) -> bool {
        matches!(self, Self::Location { .. })
    }

    /// Encode as a single-line JSON document
    ///
    /// Never fails: an encoding error yields the `PROCESSING_FAILED` payload.
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!(error = %e, "failed to encode pull response");
                PROCESSING_FAILED_JSON.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_payload() {
        let response = PullResponse::location(Location::new("12.9784,77.6408"));
        assert!(response.is_location());
        assert_eq!(response.to_json(), r#"{"location":"12.9784,77.6408"}"#);
    }

    #[test]
    fn test_no_data_yet_payload() {
        let response = PullResponse::from_latest(None);
        assert!(!response.is_location());
        assert_eq!(
            response.to_json(),
            r#"{"error":"No location data available yet"}"#
        );
    }

    #[test]
    fn test_failed_payload_matches_fallback() {
        assert_eq!(PullResponse::failed().to_json(), PROCESSING_FAILED_JSON);
    }

    #[test]
    fn test_from_latest_some() {
        let response = PullResponse::from_latest(Some(Location::new("1,2")));
        assert_eq!(response, PullResponse::location(Location::new("1,2")));
    }
}
