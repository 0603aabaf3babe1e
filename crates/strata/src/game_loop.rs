//! # STRATA Game Loop
//!
//! One synchronous tick per frame:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. CLOCK                                                            │
//! │    └─ Advance the frame clock once (delta clamped)                  │
//! │                                                                     │
//! │ 2. PHYSICS                                                          │
//! │    ├─ Apply camera override, if any                                 │
//! │    ├─ Find supporting columns                                       │
//! │    └─ Fall / walk                                                   │
//! │                                                                     │
//! │ 3. CHUNK CHECK                                                      │
//! │    └─ On crossing: resynthesize 3×3 + replay ledger (blocking)      │
//! │                                                                     │
//! │ 4. ACTIONS                                                          │
//! │    └─ Jump, mine, place, slot select                                │
//! │                                                                     │
//! │ 5. RENDER VIEW                                                      │
//! │    └─ Position/type buffers, valid until the next mutation          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Regeneration runs to completion inside the tick. A crossing that takes
//! longer than [`MAX_FRAME_TIME`] is logged, not hidden.

use std::sync::Arc;
use std::time::{Duration, Instant};

use strata_procedural::{
    ChunkCoord, ChunkGenerator, ColumnKey, MaterialClass, ModificationLedger, SharedLedger,
    VoxelKey, VoxelWorldState, WorldError, WorldSeed,
};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::inventory::Inventory;
use crate::math::Vec3;
use crate::physics::{PlayerPhysics, PlayerState, StepOutcome, SURFACE_EPSILON};
use crate::raycast::{intersect_voxels, placement_target};

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// Maximum allowed frame time before warning.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

// ============================================================================
// CLOCK
// ============================================================================

/// Monotonic frame clock, advanced at most once per tick.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last: Instant,
    max_delta: f32,
    advanced: bool,
}

impl FrameClock {
    /// Clock starting at `start`.
    #[must_use]
    pub const fn new(start: Instant, max_delta: f32) -> Self {
        Self {
            last: start,
            max_delta,
            advanced: false,
        }
    }

    /// Instant of the last advance.
    #[must_use]
    pub const fn last(&self) -> Instant {
        self.last
    }

    /// Re-arms the clock for a new tick.
    pub fn begin_tick(&mut self) {
        self.advanced = false;
    }

    /// Seconds since the last advance, clamped to the max delta.
    ///
    /// A second call within the same tick returns zero.
    pub fn advance(&mut self, now: Instant) -> f32 {
        if self.advanced {
            return 0.0;
        }
        let dt = now
            .saturating_duration_since(self.last)
            .as_secs_f32()
            .min(self.max_delta);
        self.last = now;
        self.advanced = true;
        dt
    }
}

// ============================================================================
// INPUT / OUTPUT
// ============================================================================

/// Discrete player action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    /// Jump if standing.
    Jump,
    /// Mine the voxel under the look ray.
    Mine,
    /// Place a block against the face under the look ray.
    Place,
    /// Select an inventory slot.
    SelectSlot(usize),
}

/// Input for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Moves the head here before physics runs.
    pub camera: Option<Vec3>,
    /// Walk direction; zero when idle.
    pub walk: Vec3,
    /// Look direction for mine/place. Need not be normalized.
    pub look: Vec3,
    /// Actions, applied in order after physics.
    pub actions: Vec<PlayerAction>,
}

/// Why an action did nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// Jump while not at rest.
    Airborne,
    /// Place with an empty selected slot.
    EmptySlot,
    /// Slot index out of range.
    NoSuchSlot,
    /// Placement target overlaps the player's body.
    BlockedByPlayer,
    /// The world refused the edit.
    World(WorldError),
}

/// Result of one action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Jump started.
    Jumped,
    /// Voxel mined and credited to the inventory.
    Mined {
        /// Mined voxel.
        voxel: VoxelKey,
        /// Its material.
        material: MaterialClass,
        /// Patch voxels added around the opening.
        patches: usize,
    },
    /// Block placed from the selected slot.
    Placed {
        /// New voxel.
        voxel: VoxelKey,
        /// Material taken from the inventory.
        material: MaterialClass,
    },
    /// Slot selected.
    SlotSelected(usize),
    /// Look ray hit nothing.
    Missed,
    /// Action refused.
    Rejected(RejectReason),
}

/// What happened in one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Frame number, from zero.
    pub frame: u64,
    /// Integrated time step.
    pub dt: f32,
    /// Physics outcome.
    pub outcome: StepOutcome,
    /// True if the world was rebuilt this tick.
    pub regenerated: bool,
    /// Time spent regenerating.
    pub regeneration_us: u64,
    /// Whole tick time.
    pub tick_us: u64,
    /// Rendered voxels after the tick.
    pub cube_count: usize,
    /// One outcome per input action.
    pub actions: Vec<ActionOutcome>,
}

/// Borrowed render buffers.
#[derive(Clone, Copy, Debug)]
pub struct RenderView<'a> {
    /// Four floats per voxel: x, y, z, reserved.
    pub positions: &'a [f32],
    /// One type value per voxel.
    pub types: &'a [f32],
    /// Voxel count.
    pub cube_count: usize,
}

impl RenderView<'_> {
    /// Position buffer as bytes for upload.
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.positions)
    }

    /// Type buffer as bytes for upload.
    #[must_use]
    pub fn type_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.types)
    }
}

// ============================================================================
// GAME LOOP
// ============================================================================

/// Owns the world view, player and inventory; shares the ledger.
pub struct GameLoop {
    config: EngineConfig,
    physics: PlayerPhysics,
    generator: ChunkGenerator,
    ledger: SharedLedger,
    world: VoxelWorldState,
    player: PlayerState,
    inventory: Inventory,
    clock: FrameClock,
    frame_count: u64,
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a game loop with a fresh ledger.
    ///
    /// # Errors
    ///
    /// Invalid configuration, or a spawn column that was not generated.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::with_ledger(config, ModificationLedger::shared())
    }

    /// Creates a game loop over an existing ledger, so edits made by
    /// another view show up here.
    ///
    /// # Errors
    ///
    /// As [`new`](Self::new).
    pub fn with_ledger(config: EngineConfig, ledger: SharedLedger) -> EngineResult<Self> {
        config.validate()?;

        let generator = ChunkGenerator::new(WorldSeed::new(&config.world.seed));
        let physics = PlayerPhysics::new(config.physics);
        let [sx, sz] = config.player.spawn;
        let chunk = ChunkCoord::containing(sx, sz);

        let world = {
            let guard = ledger.read();
            VoxelWorldState::generate(&generator, chunk, &guard, config.world.render_margin)
        };

        let spawn_column = ColumnKey::new(sx.round() as i32, sz.round() as i32);
        let top = world
            .try_column(spawn_column)?
            .iter()
            .copied()
            .max()
            .ok_or(WorldError::ColumnNotLoaded {
                x: spawn_column.x,
                z: spawn_column.z,
            })?;
        let head = Vec3::new(sx, top as f32 + 0.5 + config.physics.head_offset, sz);

        tracing::info!(
            seed = %config.world.seed,
            x = head.x,
            y = head.y,
            z = head.z,
            "player spawned"
        );

        Ok(Self {
            inventory: Inventory::with_blocks(&config.player.starting_blocks),
            clock: FrameClock::new(Instant::now(), config.physics.max_frame_delta),
            player: PlayerState::new(head),
            config,
            physics,
            generator,
            ledger,
            world,
            frame_count: 0,
            stats_accumulator: FrameStatsAccumulator::new(),
        })
    }

    /// Runs one tick at time `now`.
    pub fn tick(&mut self, input: &FrameInput, now: Instant) -> FrameReport {
        let tick_start = Instant::now();
        self.clock.begin_tick();
        let dt = self.clock.advance(now);

        let mut regeneration_us = 0;
        let mut regenerated = false;

        if let Some(camera) = input.camera {
            self.player.head = camera;
            if let Some(us) = self.follow_player() {
                regenerated = true;
                regeneration_us += us;
            }
        }

        let outcome = self.physics.step(&self.world, &mut self.player, input.walk, dt);

        if let Some(us) = self.follow_player() {
            regenerated = true;
            regeneration_us += us;
        }

        let actions = input
            .actions
            .iter()
            .map(|&action| self.apply_action(action, input.look))
            .collect();

        let tick_us = tick_start.elapsed().as_micros() as u64;
        let report = FrameReport {
            frame: self.frame_count,
            dt,
            outcome,
            regenerated,
            regeneration_us,
            tick_us,
            cube_count: self.world.cube_count(),
            actions,
        };

        self.frame_count += 1;
        self.stats_accumulator.record(&report);
        report
    }

    /// Regenerates around the player's chunk if it changed. Returns the
    /// time taken in microseconds.
    fn follow_player(&mut self) -> Option<u64> {
        let head = self.player.head;
        let chunk = ChunkCoord::containing(head.x, head.z);
        if chunk == self.player.chunk {
            return None;
        }

        let start = Instant::now();
        {
            let ledger = self.ledger.read();
            self.world.recenter(&self.generator, chunk, &ledger);
        }
        let elapsed = start.elapsed();

        tracing::info!(
            from_x = self.player.chunk.x,
            from_z = self.player.chunk.z,
            to_x = chunk.x,
            to_z = chunk.z,
            "crossed chunk boundary"
        );
        if elapsed > MAX_FRAME_TIME {
            tracing::warn!(
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = MAX_FRAME_TIME.as_secs_f64() * 1000.0,
                "regeneration exceeded frame budget"
            );
        }

        self.player.chunk = chunk;
        Some(elapsed.as_micros() as u64)
    }

    /// Applies one action, using `look` as the ray direction for mine and
    /// place.
    pub fn apply_action(&mut self, action: PlayerAction, look: Vec3) -> ActionOutcome {
        let outcome = match action {
            PlayerAction::Jump => {
                if self.physics.jump(&mut self.player) {
                    ActionOutcome::Jumped
                } else {
                    ActionOutcome::Rejected(RejectReason::Airborne)
                }
            }
            PlayerAction::SelectSlot(slot) => {
                if self.inventory.select(slot) {
                    ActionOutcome::SlotSelected(slot)
                } else {
                    ActionOutcome::Rejected(RejectReason::NoSuchSlot)
                }
            }
            PlayerAction::Mine => self.mine(look),
            PlayerAction::Place => self.place(look),
        };
        tracing::debug!(?action, ?outcome, "applied action");
        outcome
    }

    fn mine(&mut self, look: Vec3) -> ActionOutcome {
        let Some(direction) = look.normalized() else {
            return ActionOutcome::Missed;
        };
        let Some(hit) = intersect_voxels(&self.world, self.player.head, direction) else {
            return ActionOutcome::Missed;
        };

        let result = self.ledger.write().mine(&mut self.world, hit.voxel);
        match result {
            Ok(edit) => {
                let material = edit.material.unwrap_or(MaterialClass::Grass);
                self.inventory.add(material, 1);
                ActionOutcome::Mined {
                    voxel: hit.voxel,
                    material,
                    patches: edit.patches.len(),
                }
            }
            Err(err) => ActionOutcome::Rejected(RejectReason::World(err)),
        }
    }

    fn place(&mut self, look: Vec3) -> ActionOutcome {
        if self.inventory.selected().is_empty() {
            return ActionOutcome::Rejected(RejectReason::EmptySlot);
        }
        let Some(direction) = look.normalized() else {
            return ActionOutcome::Missed;
        };
        let origin = self.player.head;
        let Some(target) = intersect_voxels(&self.world, origin, direction)
            .and_then(|hit| placement_target(&hit, origin, direction))
        else {
            return ActionOutcome::Missed;
        };

        if self.overlaps_player(target) {
            return ActionOutcome::Rejected(RejectReason::BlockedByPlayer);
        }

        let material = self.inventory.selected().material;
        let result = self.ledger.write().place_block(&mut self.world, target, material);
        match result {
            Ok(_) => {
                self.inventory.take_selected();
                ActionOutcome::Placed {
                    voxel: target,
                    material,
                }
            }
            Err(err) => ActionOutcome::Rejected(RejectReason::World(err)),
        }
    }

    fn overlaps_player(&self, voxel: VoxelKey) -> bool {
        let feet = self.physics.feet(&self.player);
        let head = self.player.head.y;
        let y = voxel.y as f32;

        y + 0.5 > feet + SURFACE_EPSILON
            && y - 0.5 < head - SURFACE_EPSILON
            && self
                .physics
                .footprint_columns(&self.player)
                .contains(&voxel.column())
    }

    /// Current render buffers.
    #[must_use]
    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            positions: self.world.positions(),
            types: self.world.types(),
            cube_count: self.world.cube_count(),
        }
    }

    /// Player state.
    #[must_use]
    pub const fn player(&self) -> &PlayerState {
        &self.player
    }

    /// Active world view.
    #[must_use]
    pub const fn world(&self) -> &VoxelWorldState {
        &self.world
    }

    /// Shared ledger handle.
    #[must_use]
    pub fn ledger(&self) -> SharedLedger {
        Arc::clone(&self.ledger)
    }

    /// Player inventory.
    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Frame clock.
    #[must_use]
    pub const fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of tick times.
    pub tick_us_sum: u64,
    /// Min tick time.
    pub min_tick_us: u64,
    /// Max tick time.
    pub max_tick_us: u64,
    /// Ticks that exceeded the 60 FPS budget.
    pub frames_over_budget: u64,
    /// Ticks that rebuilt the world.
    pub regenerations: u64,
    /// Sum of regeneration times.
    pub regeneration_us_sum: u64,
    /// Longest regeneration.
    pub max_regeneration_us: u64,
    /// Ticks with nothing under the player.
    pub no_support_frames: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames_recorded: 0,
            tick_us_sum: 0,
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            frames_over_budget: 0,
            regenerations: 0,
            regeneration_us_sum: 0,
            max_regeneration_us: 0,
            no_support_frames: 0,
        }
    }

    /// Records a tick.
    pub fn record(&mut self, report: &FrameReport) {
        self.frames_recorded += 1;
        self.tick_us_sum += report.tick_us;
        self.min_tick_us = self.min_tick_us.min(report.tick_us);
        self.max_tick_us = self.max_tick_us.max(report.tick_us);

        if report.tick_us > TARGET_FRAME_TIME.as_micros() as u64 {
            self.frames_over_budget += 1;
        }
        if report.regenerated {
            self.regenerations += 1;
            self.regeneration_us_sum += report.regeneration_us;
            self.max_regeneration_us = self.max_regeneration_us.max(report.regeneration_us);
        }
        if report.outcome == StepOutcome::NoSupport {
            self.no_support_frames += 1;
        }
    }

    /// Returns average tick time in milliseconds.
    #[must_use]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.tick_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average regeneration time in milliseconds.
    #[must_use]
    pub fn avg_regeneration_ms(&self) -> f64 {
        if self.regenerations == 0 {
            return 0.0;
        }
        (self.regeneration_us_sum as f64 / self.regenerations as f64) / 1000.0
    }

    /// Returns the fraction of ticks over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Prints a summary of the statistics.
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                     TICK STATISTICS SUMMARY                      ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();
        println!("┌─ TIMING ─────────────────────────────────────────────────────────┐");
        println!("│ Ticks Recorded:     {}", self.frames_recorded);
        println!("│ Average Tick:       {:.3} ms", self.avg_tick_ms());
        if self.frames_recorded > 0 {
            println!("│ Min Tick:           {:.3} ms", self.min_tick_us as f64 / 1000.0);
            println!("│ Max Tick:           {:.3} ms", self.max_tick_us as f64 / 1000.0);
        }
        println!(
            "│ Over Budget:        {} ticks ({:.1}%)",
            self.frames_over_budget,
            self.over_budget_ratio() * 100.0
        );
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ WORLD ──────────────────────────────────────────────────────────┐");
        println!("│ Regenerations:      {}", self.regenerations);
        println!("│ Avg Regeneration:   {:.3} ms", self.avg_regeneration_ms());
        println!("│ Max Regeneration:   {:.3} ms", self.max_regeneration_us as f64 / 1000.0);
        println!("│ No-Support Ticks:   {}", self.no_support_frames);
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_at(game: &mut GameLoop, input: &FrameInput, ms: u64) -> FrameReport {
        let now = game.clock().last() + Duration::from_millis(ms);
        game.tick(input, now)
    }

    #[test]
    fn test_frame_clock_clamps_and_guards() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start, 0.1);

        clock.begin_tick();
        let dt = clock.advance(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-6);
        assert_eq!(clock.advance(start + Duration::from_millis(40)), 0.0, "Second advance in one tick");

        clock.begin_tick();
        let dt = clock.advance(start + Duration::from_secs(5));
        assert_eq!(dt, 0.1, "Pause clamped to max delta");
    }

    #[test]
    fn test_spawn_on_surface() {
        let game = GameLoop::new(EngineConfig::default()).expect("default config");
        let player = game.player();
        let top = game.world().top(ColumnKey::new(0, 0)).expect("spawn column");

        assert_eq!(player.head.y, top as f32 + 2.5);
        assert_eq!(player.chunk, ChunkCoord::new(0, 0));
        assert_eq!(game.frame_count(), 0);
    }

    #[test]
    fn test_idle_ticks_stay_grounded() {
        let mut game = GameLoop::new(EngineConfig::default()).expect("default config");
        let head = game.player().head;

        for _ in 0..10 {
            let report = tick_at(&mut game, &FrameInput::default(), 16);
            assert_eq!(report.outcome, StepOutcome::Grounded);
            assert!(!report.regenerated);
        }
        assert_eq!(game.player().head, head);
        assert_eq!(game.frame_count(), 10);
        assert_eq!(game.stats().frames_recorded, 10);
    }

    #[test]
    fn test_jump_action() {
        let mut game = GameLoop::new(EngineConfig::default()).expect("default config");
        let look = Vec3::ZERO;

        assert_eq!(game.apply_action(PlayerAction::Jump, look), ActionOutcome::Jumped);
        assert_eq!(
            game.apply_action(PlayerAction::Jump, look),
            ActionOutcome::Rejected(RejectReason::Airborne)
        );

        let report = tick_at(&mut game, &FrameInput::default(), 16);
        assert_eq!(report.outcome, StepOutcome::Airborne);
    }

    #[test]
    fn test_slot_selection() {
        let mut game = GameLoop::new(EngineConfig::default()).expect("default config");

        let input = FrameInput {
            actions: vec![PlayerAction::SelectSlot(1), PlayerAction::SelectSlot(7)],
            ..FrameInput::default()
        };
        let report = tick_at(&mut game, &input, 16);

        assert_eq!(
            report.actions,
            vec![
                ActionOutcome::SlotSelected(1),
                ActionOutcome::Rejected(RejectReason::NoSuchSlot)
            ]
        );
        assert_eq!(game.inventory().selected().material, MaterialClass::Dirt);
    }

    #[test]
    fn test_place_with_empty_inventory() {
        let mut game = GameLoop::new(EngineConfig::default()).expect("default config");
        let down = Vec3::new(0.0, -1.0, 0.0);

        assert_eq!(
            game.apply_action(PlayerAction::Place, down),
            ActionOutcome::Rejected(RejectReason::EmptySlot)
        );
    }

    #[test]
    fn test_render_view_bytes() {
        let game = GameLoop::new(EngineConfig::default()).expect("default config");
        let view = game.render_view();

        assert_eq!(view.positions.len(), view.cube_count * 4);
        assert_eq!(view.position_bytes().len(), view.cube_count * 16);
        assert_eq!(view.type_bytes().len(), view.cube_count * 4);
    }

    #[test]
    fn test_stats_accumulator() {
        let mut acc = FrameStatsAccumulator::new();

        for i in 0..100 {
            acc.record(&FrameReport {
                frame: i,
                dt: 0.016,
                outcome: StepOutcome::Grounded,
                regenerated: i % 50 == 0,
                regeneration_us: 20_000,
                tick_us: 10_000 + i * 100,
                cube_count: 0,
                actions: Vec::new(),
            });
        }

        assert_eq!(acc.frames_recorded, 100);
        assert_eq!(acc.regenerations, 2);
        assert!((acc.avg_regeneration_ms() - 20.0).abs() < 1e-9);
        assert!(acc.over_budget_ratio() > 0.0);
    }
}
