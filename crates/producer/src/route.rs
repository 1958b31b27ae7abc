//! Route sources
//!
//! A `RouteSource` turns a `RouteSpec` into the ordered coordinates the
//! publisher replays. Sources yield a finite sequence per call; every replay
//! fetches the route again.

use std::sync::Arc;

use async_trait::async_trait;
use fleet_config::{RouteConfig, TravelMode};
use fleet_protocol::{COORDINATE_PRECISION, Coordinate};
use tracing::debug;

use crate::error::{RouteError, RouteResult};

/// Route description handed to a route source
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSpec {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Intermediate stops, visited in order
    pub waypoints: Vec<Coordinate>,
    pub mode: TravelMode,
}

impl RouteSpec {
    /// Create a direct route with no waypoints
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            waypoints: Vec::new(),
            mode: TravelMode::default(),
        }
    }

    /// Add waypoints
    pub fn with_waypoints(mut self, waypoints: Vec<Coordinate>) -> Self {
        self.waypoints = waypoints;
        self
    }

    /// Set the travel mode
    pub fn with_mode(mut self, mode: TravelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the default route spec from configuration
    ///
    /// # Errors
    ///
    /// Returns `RouteError::Unavailable` if a stop is not a valid coordinate.
    pub fn from_config(config: &RouteConfig) -> RouteResult<Self> {
        let parse = |text: &str| {
            text.parse::<Coordinate>()
                .map_err(|e| RouteError::unavailable(format!("invalid stop '{}': {}", text, e)))
        };

        let waypoints = config
            .waypoints
            .iter()
            .map(|w| parse(w))
            .collect::<RouteResult<Vec<_>>>()?;

        Ok(Self::new(parse(&config.origin)?, parse(&config.destination)?)
            .with_waypoints(waypoints)
            .with_mode(config.mode))
    }

    /// Stops in visiting order: origin, waypoints, destination
    pub fn stops(&self) -> Vec<Coordinate> {
        let mut stops = Vec::with_capacity(self.waypoints.len() + 2);
        stops.push(self.origin);
        stops.extend_from_slice(&self.waypoints);
        stops.push(self.destination);
        stops
    }
}

/// Source of route geometry
#[async_trait]
pub trait RouteSource: Send + Sync {
    /// Resolve a route into an ordered, finite coordinate sequence
    ///
    /// Fails with `RouteError::Unavailable` on upstream errors and
    /// `RouteError::Empty` when no path exists.
    async fn fetch_route(&self, spec: &RouteSpec) -> RouteResult<Vec<Coordinate>>;
}

/// Simulated directions service
///
/// Walks origin → waypoints → destination in straight legs, emitting
/// `points_per_leg` evenly spaced points per leg plus the destination
/// itself. Points are rounded to the precision the directions API returns.
#[derive(Debug, Clone)]
pub struct InterpolatedRouteSource {
    points_per_leg: usize,
}

impl InterpolatedRouteSource {
    /// Create a source emitting `points_per_leg` points for each leg
    pub fn new(points_per_leg: usize) -> Self {
        Self { points_per_leg }
    }
}

#[async_trait]
impl RouteSource for InterpolatedRouteSource {
    async fn fetch_route(&self, spec: &RouteSpec) -> RouteResult<Vec<Coordinate>> {
        let stops = spec.stops();

        // A zero-length route has no path to drive
        if self.points_per_leg == 0 || stops.windows(2).all(|leg| leg[0] == leg[1]) {
            return Err(RouteError::Empty);
        }

        let steps = self.points_per_leg as f64;
        let mut points = Vec::with_capacity((stops.len() - 1) * self.points_per_leg + 1);
        for leg in stops.windows(2) {
            for i in 0..self.points_per_leg {
                let point = leg[0].lerp(&leg[1], i as f64 / steps);
                points.push(point.rounded(COORDINATE_PRECISION));
            }
        }
        points.push(spec.destination.rounded(COORDINATE_PRECISION));

        debug!(
            mode = spec.mode.as_str(),
            legs = stops.len() - 1,
            points = points.len(),
            "route interpolated"
        );

        Ok(points)
    }
}

/// Replays a fixed list of points regardless of the requested route
#[derive(Debug, Clone)]
pub struct StaticRouteSource {
    points: Arc<[Coordinate]>,
}

impl StaticRouteSource {
    /// Create a source from a fixed point list
    pub fn new(points: Vec<Coordinate>) -> Self {
        Self {
            points: points.into(),
        }
    }

    /// Parse `lat,lng` strings into a static route
    ///
    /// # Errors
    ///
    /// Returns `RouteError::Unavailable` naming the first unparseable point.
    pub fn parse<S: AsRef<str>>(points: &[S]) -> RouteResult<Self> {
        let points = points
            .iter()
            .map(|p| {
                let text = p.as_ref();
                text.parse::<Coordinate>().map_err(|e| {
                    RouteError::unavailable(format!("invalid point '{}': {}", text, e))
                })
            })
            .collect::<RouteResult<Vec<_>>>()?;
        Ok(Self::new(points))
    }

    /// Number of points in the route
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the route has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[async_trait]
impl RouteSource for StaticRouteSource {
    async fn fetch_route(&self, _spec: &RouteSpec) -> RouteResult<Vec<Coordinate>> {
        if self.points.is_empty() {
            return Err(RouteError::Empty);
        }
        Ok(self.points.to_vec())
    }
}

/// Pick the route source described by configuration
///
/// A non-empty `points` list selects a `StaticRouteSource`; otherwise routes
/// are interpolated between the configured stops.
pub fn route_source_from_config(config: &RouteConfig) -> RouteResult<Arc<dyn RouteSource>> {
    if config.points.is_empty() {
        Ok(Arc::new(InterpolatedRouteSource::new(config.points_per_leg)))
    } else {
        Ok(Arc::new(StaticRouteSource::parse(&config.points)?))
    }
}

#[cfg(test)]
#[path = "route_test.rs"]
mod tests;
