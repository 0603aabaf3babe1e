//! # STRATA Procedural Generation
//!
//! Deterministic voxel terrain plus the sparse edit overlay that sits on it.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Continuous**: Terrain is synthesized per 3×3 neighbourhood, so chunk
//!    edges line up exactly
//! 3. **Edits are data**: The ledger, not the world state, is the source of
//!    truth for player changes
//!
//! ## Core Components
//!
//! - `SeededRng`: string-keyed deterministic streams
//! - `NoiseField`: base octave, super base, upsampling pyramid
//! - `BiomeBlender`: amplitude/center per base cell
//! - `ChunkGenerator`: 3×3 neighbourhood to heights and type values
//! - `VoxelWorldState`: column map, index map, render buffers
//! - `ModificationLedger`: mine/place overlay, replayed on regeneration
//!
//! ## Example
//!
//! ```rust
//! use strata_procedural::{
//!     ChunkCoord, ChunkGenerator, ModificationLedger, VoxelKey, VoxelWorldState, WorldSeed,
//!     DEFAULT_RENDER_MARGIN,
//! };
//!
//! let generator = ChunkGenerator::new(WorldSeed::new("42"));
//! let mut ledger = ModificationLedger::new();
//! let mut world =
//!     VoxelWorldState::generate(&generator, ChunkCoord::new(0, 0), &ledger, DEFAULT_RENDER_MARGIN);
//!
//! let top = world.top(ChunkCoord::new(0, 0).center_column()).unwrap();
//! let key = VoxelKey::new(0, top, 0);
//! ledger.mine(&mut world, key).unwrap();
//!
//! // Regenerating replays the edit.
//! world.regenerate(&generator, &ledger);
//! assert!(!world.contains(key));
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod chunk;
pub mod error;
pub mod ledger;
pub mod noise;
pub mod seed;
pub mod world_state;

pub use biome::{BiomeBlender, BiomeClass, BiomeSample};
pub use chunk::{
    ChunkCoord, ChunkGenerator, ColumnKey, MaterialClass, SuperChunkTerrain, VoxelKey,
    MACRO_CHUNK_SIZE, SUPER_CHUNK_COLUMNS,
};
pub use error::{WorldError, WorldResult};
pub use ledger::{EditOutcome, Modification, ModificationLedger, ReplayStats, SharedLedger};
pub use noise::{combine_levels, upsample, BaseGrid, Grid, NoiseField, Pyramid};
pub use seed::{SeededRng, WorldSeed};
pub use world_state::{VoxelWorldState, DEFAULT_RENDER_MARGIN, POSITION_STRIDE};
