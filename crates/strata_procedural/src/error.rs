//! # World Error Types
//!
//! Errors raised by strict voxel lookups and ledger edits.

use thiserror::Error;

/// Errors that can occur when editing or querying the voxel world.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    /// The column lies outside the materialized super-chunk.
    #[error("column ({x}, {z}) is not loaded")]
    ColumnNotLoaded {
        /// World X.
        x: i32,
        /// World Z.
        z: i32,
    },

    /// No voxel at the requested coordinate.
    #[error("no voxel at ({x}, {y}, {z})")]
    VoxelNotFound {
        /// World X.
        x: i32,
        /// Height.
        y: i32,
        /// World Z.
        z: i32,
    },

    /// A voxel already occupies the requested coordinate.
    #[error("voxel at ({x}, {y}, {z}) is already occupied")]
    Occupied {
        /// World X.
        x: i32,
        /// Height.
        y: i32,
        /// World Z.
        z: i32,
    },
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;
