//! Error types for level construction and registry edits.

use blockworld_core::TileId;
use thiserror::Error;

/// Failures raised while building a level or editing the tile registry.
///
/// Simulation itself never fails: stale events and out-of-bounds accesses
/// resolve silently.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A grid axis was zero or negative.
    #[error("level dimensions must be positive, got {x}x{y}x{z}")]
    InvalidDimensions {
        /// Requested X extent.
        x: i32,
        /// Requested Y extent.
        y: i32,
        /// Requested Z extent.
        z: i32,
    },
    /// The tile array does not match the requested dimensions.
    #[error("tile array holds {actual} entries, expected {expected}")]
    TileCountMismatch {
        /// Entries required by the dimensions.
        expected: usize,
        /// Entries supplied.
        actual: usize,
    },
    /// A registry slot is already occupied.
    #[error("tile id {0} is already registered")]
    DuplicateTile(TileId),
    /// No tile carries the requested name.
    #[error("unknown tile name `{0}`")]
    UnknownTile(String),
}
