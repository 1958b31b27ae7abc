//! Location wire text and topic updates
//!
//! `Location` is the exact text published to the topic and pushed to
//! listeners. It is reference-counted so fan-out to many listeners clones a
//! pointer, not the string.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::coordinate::Coordinate;

/// Position text as carried on the wire (`"lat,lng"`)
///
/// The text is kept verbatim: a location built from a configured seed such
/// as `"12.9784, 77.6408"` renders exactly as configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location(Arc<str>);

impl Location {
    /// Wrap wire text without validating it
    #[inline]
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// Get the wire text
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the wire text back into a coordinate
    pub fn coordinate(&self) -> crate::Result<Coordinate> {
        self.0.parse()
    }
}

impl From<Coordinate> for Location {
    fn from(coord: Coordinate) -> Self {
        Self(coord.to_string().into())
    }
}

impl From<&str> for Location {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Location {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A location delivered from the topic, tagged with its offset
///
/// Offsets are assigned by the topic in publish order and are what makes
/// redelivery detectable on the consumer side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionUpdate {
    /// Position of this record in the topic log
    pub offset: u64,
    /// Published location text
    pub location: Location,
}

impl PositionUpdate {
    /// Create a new update
    #[inline]
    pub fn new(offset: u64, location: Location) -> Self {
        Self { offset, location }
    }
}
