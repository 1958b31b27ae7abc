//! Geographic coordinate
//!
//! `Coordinate` is an immutable (latitude, longitude) pair with no identity
//! beyond its value. Construction validates range and finiteness so every
//! coordinate that reaches the topic is renderable.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// A (latitude, longitude) pair in decimal degrees
///
/// # Example
///
/// ```
/// use fleet_protocol::Coordinate;
///
/// let coord: Coordinate = "12.9784, 77.6408".parse().unwrap();
/// assert_eq!(coord.to_string(), "12.9784,77.6408");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Create a coordinate, validating that both components are finite and in range
    pub fn new(lat: f64, lng: f64) -> crate::Result<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(ProtocolError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ProtocolError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ProtocolError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in decimal degrees
    #[inline]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees
    #[inline]
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Point at fraction `t` along the straight segment from `self` to `other`
    ///
    /// `t` is clamped to [0, 1], so the result is always a valid coordinate.
    pub fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        let t = t.clamp(0.0, 1.0);
        Coordinate {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// Round both components to `places` decimal places
    pub fn rounded(&self, places: u32) -> Coordinate {
        let factor = 10f64.powi(places as i32);
        Coordinate {
            lat: (self.lat * factor).round() / factor,
            lng: (self.lng * factor).round() / factor,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

impl FromStr for Coordinate {
    type Err = ProtocolError;

    /// Parse `lat,lng`, tolerating whitespace around either component
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| ProtocolError::invalid_coordinate(s, "missing ',' separator"))?;

        let lat = lat
            .trim()
            .parse::<f64>()
            .map_err(|_| ProtocolError::invalid_coordinate(s, "latitude is not a number"))?;
        let lng = lng
            .trim()
            .parse::<f64>()
            .map_err(|_| ProtocolError::invalid_coordinate(s, "longitude is not a number"))?;

        Self::new(lat, lng)
    }
}

impl TryFrom<(f64, f64)> for Coordinate {
    type Error = ProtocolError;

    fn try_from((lat, lng): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(lat, lng)
    }
}
