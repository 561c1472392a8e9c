//! Error types for level loading and object placement.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed geometry or object data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Reference or position outside the valid range
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
