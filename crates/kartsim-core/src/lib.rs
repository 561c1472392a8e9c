//! Core types, math, and traits for the kartsim movement core.
//!
//! This crate provides the foundational types used throughout the simulation:
//! - 16.16 fixed-point scalars
//! - Bounding boxes and line-side tests
//! - Blockmap cell coordinates
//! - Geometry identifiers and the shared error type

pub mod coords;
pub mod error;
pub mod fixed;
pub mod math;
pub mod types;

pub use coords::{BlockPos, BlockRange};
pub use error::{Error, Result};
pub use fixed::Fixed;
pub use math::{BBox, Segment, Side};
pub use types::{LineId, SectorId, SlopeId, VertexId};

/// Engine-wide constants
pub mod constants {
    use crate::Fixed;

    /// Fractional bits of a [`Fixed`] value.
    pub const FRACBITS: u32 = 16;
    /// Raw value of 1.0 in fixed-point.
    pub const FRACUNIT: i32 = 1 << FRACBITS;
    /// Shift from map units to blockmap cells (128 units per cell).
    pub const MAP_BLOCK_SHIFT: u32 = 7;
    /// Size of a blockmap cell in map units.
    pub const MAP_BLOCK_UNITS: i32 = 1 << MAP_BLOCK_SHIFT;
    /// Largest object radius the blockmap pads queries for.
    pub const MAX_RADIUS: Fixed = Fixed::from_int(32);
    /// Default maximum floor rise an object may climb in one move.
    pub const MAX_STEP_MOVE: Fixed = Fixed::from_int(24);
    /// Default maximum drop for objects that refuse to walk off ledges.
    pub const MAX_DROPOFF: Fixed = Fixed::from_int(24);
}
