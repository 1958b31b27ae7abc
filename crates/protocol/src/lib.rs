//! Fleet Protocol - Core position types for the fleet relay
//!
//! This crate provides the types that flow from the route replay on the
//! producer side, through the broker topic, to the live listeners:
//! - `Coordinate` - A validated (latitude, longitude) pair
//! - `Location` - The `lat,lng` wire text carried on the topic and pushed to listeners
//! - `PositionUpdate` - A location tagged with its topic offset
//! - `PositionWriter` / `PositionReader` - The single-writer "latest position" cell
//!
//! # Wire Format
//!
//! Positions travel as plain text: `"<lat>,<lng>"`. Consumers treat the text
//! as opaque and forward it verbatim, so a location is only parsed back into
//! a `Coordinate` when a caller explicitly asks for it.

mod coordinate;
mod error;
mod latest;
mod location;

pub use coordinate::Coordinate;
pub use error::ProtocolError;
pub use latest::{PositionReader, PositionWriter, latest_position, seeded_position};
pub use location::{Location, PositionUpdate};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Seed reported by the producer before any route has been replayed
pub const DEFAULT_SEED_LOCATION: &str = "12.9784, 77.6408";

/// Decimal places kept for simulated coordinates (matches encoded polyline precision)
pub const COORDINATE_PRECISION: u32 = 5;
