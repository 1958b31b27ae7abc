//! Default route configuration
//!
//! The route the producer replays when its trigger endpoint is called.

use serde::Deserialize;

/// Travel mode requested from the route source
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    /// Road travel (default)
    #[default]
    Driving,
    /// On foot
    Walking,
    /// By bicycle
    Bicycling,
    /// Public transport
    Transit,
}

impl TravelMode {
    /// Lowercase name as used in configuration and route requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Bicycling => "bicycling",
            Self::Transit => "transit",
        }
    }
}

/// Route configuration
///
/// Coordinates are written as `"lat,lng"` strings, the same text that
/// travels on the topic.
///
/// # Example
///
/// ```toml
/// [route]
/// origin = "12.9784,77.6408"
/// destination = "12.9308,77.5839"
/// waypoints = []
/// mode = "driving"
/// points_per_leg = 20
/// ```
///
/// Setting `points` replays exactly that list instead of simulating a path.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Start of the route
    /// Default: "12.9784,77.6408"
    pub origin: String,

    /// End of the route
    /// Default: "12.9308,77.5839"
    pub destination: String,

    /// Intermediate stops, in order
    /// Default: none
    pub waypoints: Vec<String>,

    /// Travel mode
    /// Default: driving
    pub mode: TravelMode,

    /// Simulated points emitted per leg (origin→waypoint, ..., →destination)
    /// Default: 20
    pub points_per_leg: usize,

    /// Fixed list of points to replay verbatim (overrides simulation)
    /// Default: none
    pub points: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            origin: "12.9784,77.6408".into(),
            destination: "12.9308,77.5839".into(),
            waypoints: Vec::new(),
            mode: TravelMode::Driving,
            points_per_leg: 20,
            points: Vec::new(),
        }
    }
}
