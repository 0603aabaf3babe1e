//! # STRATA
//!
//! Player-facing half of the engine: physics against the voxel column map,
//! ray picking, the block inventory and the synchronous frame loop.
//!
//! Terrain synthesis and the edit ledger live in [`strata_procedural`];
//! this crate drives them once per tick.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use strata::{EngineConfig, FrameInput, GameLoop, Vec3};
//!
//! let mut game = GameLoop::new(EngineConfig::default()).unwrap();
//! let input = FrameInput {
//!     walk: Vec3::X,
//!     ..FrameInput::default()
//! };
//! let now = game.clock().last() + Duration::from_millis(16);
//! let report = game.tick(&input, now);
//! assert_eq!(report.frame, 0);
//! ```

#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod game_loop;
pub mod inventory;
pub mod math;
pub mod physics;
pub mod raycast;

pub use config::{EngineConfig, PhysicsConfig, PlayerConfig, StartingBlocks, WorldConfig};
pub use error::{ConfigError, EngineError, EngineResult};
pub use game_loop::{
    ActionOutcome, FrameClock, FrameInput, FrameReport, FrameStatsAccumulator, GameLoop,
    PlayerAction, RejectReason, RenderView, MAX_FRAME_TIME, TARGET_FRAME_TIME,
};
pub use inventory::{BlockStack, Inventory, SLOT_COUNT};
pub use math::Vec3;
pub use physics::{PlayerPhysics, PlayerState, StepOutcome, SupportingCube};
pub use raycast::{intersect_voxel, intersect_voxels, placement_offset, placement_target, RayHit};
