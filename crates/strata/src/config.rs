//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) is a valid configuration.
//!
//! ```toml
//! [world]
//! seed = "42"
//! render_margin = 16
//!
//! [physics]
//! gravity = -9.8
//! jump_velocity = 10.0
//!
//! [player]
//! spawn = [0.0, 0.0]
//! starting_blocks = { grass = 8, dirt = 0, marble = 0 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_procedural::MaterialClass;

use crate::error::ConfigError;
use crate::physics::{
    FOOTPRINT_RADIUS, GRAVITY, HEAD_OFFSET, JUMP_VELOCITY, MAX_FRAME_DELTA, WALK_SPEED,
};

/// Narrowest margin that still hides clamped noise stencils at the border.
pub const MIN_RENDER_MARGIN: i32 = 14;

/// Widest margin that leaves the center chunk fully rendered.
pub const MAX_RENDER_MARGIN: i32 = 48;

/// Largest spawn coordinate magnitude, in columns. Past this, `f32`
/// positions lose sub-voxel precision and chunk arithmetic nears `i32`
/// overflow.
pub const MAX_SPAWN_COORD: f32 = 1.0e6;

/// Root configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World generation.
    pub world: WorldConfig,
    /// Player physics.
    pub physics: PhysicsConfig,
    /// Player start state.
    pub player: PlayerConfig,
}

/// World generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// User-facing seed string.
    pub seed: String,
    /// Columns on each side of the super-chunk kept out of the buffers.
    pub render_margin: i32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: "42".to_string(),
            render_margin: strata_procedural::DEFAULT_RENDER_MARGIN,
        }
    }
}

/// Player physics settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration, units per second squared. Negative is down.
    pub gravity: f32,
    /// Upward velocity applied by a jump.
    pub jump_velocity: f32,
    /// Distance from feet to head (camera).
    pub head_offset: f32,
    /// Half-width of the player's square footprint.
    pub footprint_radius: f32,
    /// Horizontal speed for a unit walk vector, units per second.
    pub walk_speed: f32,
    /// Longest time step a single tick may integrate, in seconds.
    pub max_frame_delta: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            jump_velocity: JUMP_VELOCITY,
            head_offset: HEAD_OFFSET,
            footprint_radius: FOOTPRINT_RADIUS,
            walk_speed: WALK_SPEED,
            max_frame_delta: MAX_FRAME_DELTA,
        }
    }
}

/// Player start state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Spawn column, `[x, z]`.
    pub spawn: [f32; 2],
    /// Blocks in each inventory slot at start.
    pub starting_blocks: StartingBlocks,
}

/// Initial inventory counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingBlocks {
    /// Grass blocks.
    pub grass: u32,
    /// Dirt blocks.
    pub dirt: u32,
    /// Marble blocks.
    pub marble: u32,
}

impl StartingBlocks {
    /// Count for a material.
    #[must_use]
    pub const fn count(&self, material: MaterialClass) -> u32 {
        match material {
            MaterialClass::Grass => self.grass,
            MaterialClass::Dirt => self.dirt,
            MaterialClass::Marble => self.marble,
        }
    }

    /// Sum over all materials.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.grass as u64 + self.dirt as u64 + self.marble as u64
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML, [`ConfigError::Invalid`] on
    /// out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), seed = %config.world.seed, "loaded config");
        Ok(config)
    }

    /// Serializes to TOML.
    ///
    /// # Errors
    ///
    /// Propagates the serializer's error message as [`ConfigError::Invalid`].
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    // Negated comparisons so NaN fails every check.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(p.gravity < 0.0) {
            return invalid(format!("physics.gravity must be negative, got {}", p.gravity));
        }
        if !(p.jump_velocity > 0.0) {
            return invalid(format!(
                "physics.jump_velocity must be positive, got {}",
                p.jump_velocity
            ));
        }
        if !(p.head_offset > 0.0) {
            return invalid(format!(
                "physics.head_offset must be positive, got {}",
                p.head_offset
            ));
        }
        if !(p.footprint_radius > 0.0 && p.footprint_radius < 0.5) {
            return invalid(format!(
                "physics.footprint_radius must be in (0, 0.5), got {}",
                p.footprint_radius
            ));
        }
        if !(p.walk_speed >= 0.0) {
            return invalid(format!(
                "physics.walk_speed must not be negative, got {}",
                p.walk_speed
            ));
        }
        if !(p.max_frame_delta > 0.0) {
            return invalid(format!(
                "physics.max_frame_delta must be positive, got {}",
                p.max_frame_delta
            ));
        }

        let margin = self.world.render_margin;
        if !(MIN_RENDER_MARGIN..=MAX_RENDER_MARGIN).contains(&margin) {
            return invalid(format!(
                "world.render_margin must be in [{MIN_RENDER_MARGIN}, {MAX_RENDER_MARGIN}], got {margin}"
            ));
        }

        let [x, z] = self.player.spawn;
        if !(x.abs() <= MAX_SPAWN_COORD && z.abs() <= MAX_SPAWN_COORD) {
            return invalid(format!(
                "player.spawn must be within {MAX_SPAWN_COORD} of the origin, got [{x}, {z}]"
            ));
        }

        Ok(())
    }
}
