//! Latest-position cell
//!
//! A single mutable slot holding the most recently observed location, split
//! into one `PositionWriter` and any number of `PositionReader`s. The writer
//! is not `Clone`: whichever component holds it is the only one
//! that can change the cell.
//!
//! # Usage
//!
//! ```
//! use fleet_protocol::{Location, latest_position};
//!
//! let (writer, reader) = latest_position::<Location>();
//! assert!(reader.get().is_none());
//!
//! writer.set(Location::new("12.9,77.6"));
//! assert_eq!(reader.get().unwrap().as_str(), "12.9,77.6");
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

/// Create an unset cell
pub fn latest_position<T: Clone>() -> (PositionWriter<T>, PositionReader<T>) {
    let slot = Arc::new(RwLock::new(None));
    (
        PositionWriter {
            slot: Arc::clone(&slot),
        },
        PositionReader { slot },
    )
}

/// Create a cell that starts out holding `seed`
pub fn seeded_position<T: Clone>(seed: T) -> (PositionWriter<T>, PositionReader<T>) {
    let (writer, reader) = latest_position();
    writer.set(seed);
    (writer, reader)
}

/// The only handle that can change the cell
#[derive(Debug)]
pub struct PositionWriter<T> {
    slot: Arc<RwLock<Option<T>>>,
}

impl<T: Clone> PositionWriter<T> {
    /// Overwrite the cell, returning the previous value
    #[inline]
    pub fn set(&self, value: T) -> Option<T> {
        self.slot.write().replace(value)
    }

    /// Current value as seen by the writer
    #[inline]
    pub fn get(&self) -> Option<T> {
        self.slot.read().clone()
    }

    /// Create another read handle on the same cell
    pub fn reader(&self) -> PositionReader<T> {
        PositionReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// Read handle; cheap to clone and share across tasks
#[derive(Debug)]
pub struct PositionReader<T> {
    slot: Arc<RwLock<Option<T>>>,
}

impl<T> Clone for PositionReader<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Clone> PositionReader<T> {
    /// Current value, or `None` if nothing has been written yet
    #[inline]
    pub fn get(&self) -> Option<T> {
        self.slot.read().clone()
    }

    /// Whether the cell has ever been written
    #[inline]
    pub fn is_set(&self) -> bool {
        self.slot.read().is_some()
    }
}
