//! Fleet Producer - Route replay onto the position topic
//!
//! Fetches a route from a `RouteSource` and publishes each point to the
//! broker topic at a steady cadence, keeping the last published location
//! for synchronous readers.
//!
//! # Architecture
//!
//! ```text
//! PUT /location ──→ Publisher::trigger_update
//!                        │
//!                        ├── RouteSource::fetch_route(spec) → [c0, c1, ..., cn]
//!                        │
//!                        └── for each point: publish ─→ TopicPublisher
//!                                            set latest
//!                                            sleep(interval)
//!
//! GET /location ──→ Publisher::last_known_position
//! ```
//!
//! # Example
//!
//! ```ignore
//! let routes = route_source_from_config(&config.route)?;
//! let publisher = Arc::new(Publisher::new(
//!     routes,
//!     broker,
//!     TopicName::new(&config.broker.topic),
//!     config.producer.interval,
//!     Location::new(config.producer.seed.as_str()),
//! ));
//!
//! let report = publisher.trigger_update(&RouteSpec::from_config(&config.route)?).await?;
//! ```

mod error;
pub mod http;
mod metrics;
mod publisher;
mod route;

pub use error::{ProducerError, Result, RouteError, RouteResult};
pub use http::{ProducerServer, ServerError};
pub use metrics::{ProducerMetrics, ProducerMetricsSnapshot};
pub use publisher::{Publisher, ReplayReport};
pub use route::{
    InterpolatedRouteSource, RouteSource, RouteSpec, StaticRouteSource, route_source_from_config,
};

pub use fleet_config::TravelMode;
