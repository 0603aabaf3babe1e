//! # STRATA Player Physics
//!
//! Column-based character controller against the voxel world state.
//!
//! Features:
//! - Supporting-surface search under a square footprint
//! - Semi-implicit Euler fall with ceiling clamp
//! - Per-axis walk veto against neighbouring columns
//! - Single jump from rest
//!
//! Voxels are unit cubes centered on integer coordinates, so a voxel at
//! height `h` has its top face at `h + 0.5`.

use strata_procedural::{ChunkCoord, ColumnKey, VoxelWorldState};

use crate::config::PhysicsConfig;
use crate::math::Vec3;

/// Default vertical acceleration (units per second squared).
pub const GRAVITY: f32 = -9.8;

/// Default jump velocity (units per second).
pub const JUMP_VELOCITY: f32 = 10.0;

/// Default distance from feet to head.
pub const HEAD_OFFSET: f32 = 2.0;

/// Default footprint half-width.
pub const FOOTPRINT_RADIUS: f32 = 0.4;

/// Default walk speed (units per second).
pub const WALK_SPEED: f32 = 4.0;

/// Default cap on a single tick's time step (seconds).
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Slack for float comparisons against voxel faces.
pub const SURFACE_EPSILON: f32 = 1e-3;

/// Half the edge of a voxel.
const HALF_VOXEL: f32 = 0.5;

// ============================================================================
// PLAYER STATE
// ============================================================================

/// Kinematic player state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerState {
    /// Head (camera) position.
    pub head: Vec3,
    /// Vertical velocity, positive is up.
    pub velocity: f32,
    /// Chunk the world state was last generated around.
    pub chunk: ChunkCoord,
    /// Set while in the air after leaving the ground.
    pub falling: bool,
    /// Set from a jump until landing.
    pub jumping: bool,
}

impl PlayerState {
    /// Player at rest with its head at `head`.
    #[must_use]
    pub fn new(head: Vec3) -> Self {
        Self {
            head,
            velocity: 0.0,
            chunk: ChunkCoord::containing(head.x, head.z),
            falling: false,
            jumping: false,
        }
    }

    /// True with no vertical motion.
    #[must_use]
    pub fn at_rest(&self) -> bool {
        self.velocity == 0.0
    }
}

/// Highest voxel below the feet in one footprint column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupportingCube {
    /// Column holding the voxel.
    pub column: ColumnKey,
    /// Voxel height.
    pub height: i32,
}

impl SupportingCube {
    /// Top face of the voxel.
    #[must_use]
    pub fn surface(&self) -> f32 {
        self.height as f32 + HALF_VOXEL
    }
}

/// What one physics step did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Standing on a surface at rest.
    Grounded,
    /// Rising or falling.
    Airborne,
    /// Nothing under the footprint; the step was a no-op.
    NoSupport,
}

// ============================================================================
// PHYSICS
// ============================================================================

/// Stateless physics rules, parameterized by [`PhysicsConfig`].
#[derive(Clone, Copy, Debug)]
pub struct PlayerPhysics {
    config: PhysicsConfig,
}

impl Default for PlayerPhysics {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PlayerPhysics {
    /// Creates physics with the given constants.
    #[must_use]
    pub const fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    /// Constants in use.
    #[must_use]
    pub const fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Feet height for a state.
    #[must_use]
    pub fn feet(&self, state: &PlayerState) -> f32 {
        state.head.y - self.config.head_offset
    }

    /// Columns under the square footprint, from the 3×3 block around the
    /// rounded position.
    #[must_use]
    pub fn footprint_columns(&self, state: &PlayerState) -> Vec<ColumnKey> {
        let r = self.config.footprint_radius;
        let (x, z) = (state.head.x, state.head.z);
        let samples = [-r, 0.0, r];
        let center = ColumnKey::new(x.round() as i32, z.round() as i32);

        let mut columns = Vec::with_capacity(4);
        for dz in -1..=1 {
            for dx in -1..=1 {
                let column = center.offset(dx, dz);
                let (cx, cz) = (column.x as f32, column.z as f32);
                let overlaps = samples.iter().any(|&ox| {
                    samples.iter().any(|&oz| {
                        (x + ox - cx).abs() <= HALF_VOXEL && (z + oz - cz).abs() <= HALF_VOXEL
                    })
                });
                if overlaps {
                    columns.push(column);
                }
            }
        }
        columns
    }

    /// For every footprint column, the highest voxel whose top face is at
    /// or below the feet.
    #[must_use]
    pub fn find_supporting_cubes(
        &self,
        world: &VoxelWorldState,
        state: &PlayerState,
    ) -> Vec<SupportingCube> {
        let feet = self.feet(state);

        self.footprint_columns(state)
            .into_iter()
            .filter_map(|column| {
                let height = world
                    .column(column)?
                    .iter()
                    .copied()
                    .filter(|&h| h as f32 + HALF_VOXEL <= feet + SURFACE_EPSILON)
                    .max()?;
                Some(SupportingCube { column, height })
            })
            .collect()
    }

    /// Highest supporting surface.
    #[must_use]
    pub fn support_surface(supports: &[SupportingCube]) -> Option<f32> {
        supports
            .iter()
            .map(SupportingCube::surface)
            .reduce(f32::max)
    }

    /// True if the player is above `surface` or still moving vertically.
    #[must_use]
    pub fn can_fall(&self, state: &PlayerState, surface: f32) -> bool {
        self.feet(state) > surface + SURFACE_EPSILON || state.velocity != 0.0
    }

    /// Integrates one vertical step.
    ///
    /// Feet never pass below `surface`; reaching it zeroes the velocity.
    /// Rising into a voxel above the head in any footprint column stops at
    /// its bottom face.
    pub fn fall(&self, world: &VoxelWorldState, state: &mut PlayerState, surface: f32, dt: f32) {
        let offset = self.config.head_offset;
        let head_before = state.head.y;

        state.velocity += self.config.gravity * dt;
        let mut feet = (self.feet(state) + state.velocity * dt).max(surface);

        if state.velocity > 0.0 {
            let ceiling = self
                .footprint_columns(state)
                .into_iter()
                .filter_map(|column| world.column(column))
                .flat_map(|heights| heights.iter().copied())
                .map(|h| h as f32 - HALF_VOXEL)
                .filter(|&bottom| bottom >= head_before - SURFACE_EPSILON)
                .reduce(f32::min);

            if let Some(bottom) = ceiling {
                if feet + offset > bottom {
                    tracing::trace!(bottom, "head hit ceiling");
                    feet = bottom - offset;
                    state.velocity = 0.0;
                }
            }
        }

        if feet <= surface {
            feet = surface;
            state.velocity = 0.0;
            state.jumping = false;
        }

        state.falling = state.velocity < 0.0;
        state.head.y = feet + offset;
    }

    /// Starts a jump if at rest. Returns `false` mid-air.
    pub fn jump(&self, state: &mut PlayerState) -> bool {
        if !state.at_rest() {
            return false;
        }
        state.velocity = self.config.jump_velocity;
        state.jumping = true;
        true
    }

    /// Horizontal displacement allowed out of `displacement`.
    ///
    /// Each axis is checked on its own: if the next column along the motion,
    /// from any supporting column, holds a voxel overlapping the body between
    /// feet and head, that axis is zeroed. Diagonal corners are not checked.
    #[must_use]
    pub fn walk(
        &self,
        world: &VoxelWorldState,
        state: &PlayerState,
        supports: &[SupportingCube],
        displacement: Vec3,
    ) -> Vec3 {
        let feet = self.feet(state);
        let head = state.head.y;

        let blocked = |dx: i32, dz: i32| {
            supports.iter().any(|support| {
                world
                    .column(support.column.offset(dx, dz))
                    .is_some_and(|heights| {
                        heights.iter().any(|&h| {
                            let h = h as f32;
                            h + HALF_VOXEL > feet + SURFACE_EPSILON
                                && h - HALF_VOXEL < head - SURFACE_EPSILON
                        })
                    })
            })
        };

        let mut allowed = Vec3::new(displacement.x, 0.0, displacement.z);
        if allowed.x != 0.0 && blocked(sign(allowed.x), 0) {
            allowed.x = 0.0;
        }
        if allowed.z != 0.0 && blocked(0, sign(allowed.z)) {
            allowed.z = 0.0;
        }
        allowed
    }

    /// One full step: support search, fall, walk.
    ///
    /// `walk_direction` is scaled by the walk speed and `dt`; its vertical
    /// component is ignored.
    pub fn step(
        &self,
        world: &VoxelWorldState,
        state: &mut PlayerState,
        walk_direction: Vec3,
        dt: f32,
    ) -> StepOutcome {
        let supports = self.find_supporting_cubes(world, state);
        let Some(surface) = Self::support_surface(&supports) else {
            tracing::warn!(
                x = state.head.x,
                y = state.head.y,
                z = state.head.z,
                "no supporting column under player"
            );
            return StepOutcome::NoSupport;
        };

        if self.can_fall(state, surface) {
            self.fall(world, state, surface, dt);
        }

        let displacement = walk_direction * (self.config.walk_speed * dt);
        state.head += self.walk(world, state, &supports, displacement);

        if state.at_rest() && self.feet(state) <= surface + SURFACE_EPSILON {
            StepOutcome::Grounded
        } else {
            StepOutcome::Airborne
        }
    }
}

fn sign(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else {
        -1
    }
}
