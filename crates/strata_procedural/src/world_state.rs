//! # Voxel World State
//!
//! The materialized super-chunk: one height list per column, an index from
//! `(column, height)` to render-buffer slot, and the flat buffers handed to
//! the renderer.
//!
//! ## Buffers
//!
//! ```text
//! positions: [x, y, z, 0.0,  x, y, z, 0.0,  ...]   4 floats per voxel
//! types:     [t,             t,             ...]   1 float per voxel, 0..=10
//! ```
//!
//! Only the interior window (the super-chunk minus a margin ring) is written
//! to the buffers. The margin exists so noise and physics near the window
//! edge see real neighbours.
//!
//! ## Lookup Policy
//!
//! Edits addressed at columns outside the super-chunk are tolerated: the
//! plain mutators return `false` and log at `debug`. The `try_*` variants
//! return a [`WorldError`] instead.

use std::collections::HashMap;
use std::time::Instant;

use crate::chunk::{
    ChunkCoord, ChunkGenerator, ColumnKey, MaterialClass, SuperChunkTerrain, VoxelKey,
};
use crate::error::{WorldError, WorldResult};
use crate::ledger::ModificationLedger;

/// Floats per voxel in the position buffer.
pub const POSITION_STRIDE: usize = 4;

/// Default margin ring excluded from rendering, in columns.
pub const DEFAULT_RENDER_MARGIN: i32 = 16;

/// Column map, index map and render buffers for one super-chunk.
#[derive(Clone, Debug)]
pub struct VoxelWorldState {
    /// Center macro-chunk.
    center: ChunkCoord,
    /// World column at local `(0, 0)`.
    origin: ColumnKey,
    /// Columns per side.
    size: i32,
    /// Columns per side excluded from the buffers.
    margin: i32,
    /// Heights per column, in insertion order.
    columns: HashMap<ColumnKey, Vec<i32>>,
    /// Natural type value per column.
    natural: HashMap<ColumnKey, f32>,
    /// Material of player-placed voxels.
    placed: HashMap<VoxelKey, MaterialClass>,
    /// Buffer slot per (column, height), interior only.
    index: HashMap<ColumnKey, HashMap<i32, usize>>,
    /// Flat position buffer.
    positions: Vec<f32>,
    /// Flat type buffer.
    types: Vec<f32>,
    /// Voxels in the interior window.
    cube_count: usize,
    /// Set by `add_cube`/`remove_cube`, cleared by `rebuild_buffers`.
    stale: bool,
}

impl VoxelWorldState {
    /// Builds the column map for synthesized terrain and fills the buffers.
    #[must_use]
    pub fn from_terrain(terrain: &SuperChunkTerrain, margin: i32) -> Self {
        Self::from_heightmap(
            terrain.center(),
            terrain.origin(),
            terrain.size(),
            terrain.heights(),
            terrain.materials(),
            margin,
        )
    }

    /// Builds the column map from raw row-major grids.
    ///
    /// Where a column stands more than one above an edge-adjacent column,
    /// the gap below it is filled down to one above the lowest such
    /// neighbour, so no side face shows a hole.
    #[must_use]
    pub fn from_heightmap(
        center: ChunkCoord,
        origin: ColumnKey,
        size: usize,
        heights: &[i32],
        materials: &[f32],
        margin: i32,
    ) -> Self {
        debug_assert_eq!(heights.len(), size * size);
        debug_assert_eq!(materials.len(), heights.len());

        let side = size as i32;
        let height_at = |lx: i32, lz: i32| -> Option<i32> {
            ((0..side).contains(&lx) && (0..side).contains(&lz))
                .then(|| heights[(lz * side + lx) as usize])
        };

        let mut columns = HashMap::with_capacity(size * size);
        let mut natural = HashMap::with_capacity(size * size);

        for lz in 0..side {
            for lx in 0..side {
                let h = heights[(lz * side + lx) as usize];
                let lowest_neighbor = [(-1, 0), (1, 0), (0, -1), (0, 1)]
                    .iter()
                    .filter_map(|&(dx, dz)| height_at(lx + dx, lz + dz))
                    .min()
                    .unwrap_or(h);

                let mut stack = vec![h];
                if h - lowest_neighbor > 1 {
                    stack.extend((lowest_neighbor + 1..h).rev());
                }

                let key = origin.offset(lx, lz);
                columns.insert(key, stack);
                natural.insert(key, materials[(lz * side + lx) as usize]);
            }
        }

        let mut world = Self {
            center,
            origin,
            size: side,
            margin,
            columns,
            natural,
            placed: HashMap::new(),
            index: HashMap::new(),
            positions: Vec::new(),
            types: Vec::new(),
            cube_count: 0,
            stale: true,
        };
        world.rebuild_buffers();
        world
    }

    /// Synthesizes the super-chunk around `center`, replays the ledger over
    /// it and fills the buffers.
    #[must_use]
    pub fn generate(
        generator: &ChunkGenerator,
        center: ChunkCoord,
        ledger: &ModificationLedger,
        margin: i32,
    ) -> Self {
        let start = Instant::now();

        let terrain = generator.synthesize_super_chunk(center);
        let mut world = Self::from_terrain(&terrain, margin);
        let stats = ledger.replay(&mut world);
        world.rebuild_buffers();

        tracing::info!(
            cx = center.x,
            cz = center.z,
            cubes = world.cube_count,
            replayed = stats.applied,
            skipped = stats.skipped,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "regenerated world state"
        );

        world
    }

    /// Rebuilds this super-chunk from noise and the ledger.
    ///
    /// With no ledger changes in between, the buffers come out identical.
    pub fn regenerate(&mut self, generator: &ChunkGenerator, ledger: &ModificationLedger) {
        *self = Self::generate(generator, self.center, ledger, self.margin);
    }

    /// Moves the super-chunk to a new center and regenerates.
    pub fn recenter(
        &mut self,
        generator: &ChunkGenerator,
        center: ChunkCoord,
        ledger: &ModificationLedger,
    ) {
        *self = Self::generate(generator, center, ledger, self.margin);
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Center macro-chunk.
    #[must_use]
    pub const fn center(&self) -> ChunkCoord {
        self.center
    }

    /// World column at local `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> ColumnKey {
        self.origin
    }

    /// Margin ring width.
    #[must_use]
    pub const fn margin(&self) -> i32 {
        self.margin
    }

    /// True if the column belongs to the materialized super-chunk.
    #[must_use]
    pub fn in_region(&self, column: ColumnKey) -> bool {
        let lx = column.x - self.origin.x;
        let lz = column.z - self.origin.z;
        (0..self.size).contains(&lx) && (0..self.size).contains(&lz)
    }

    /// True if the column is rendered.
    #[must_use]
    pub fn in_window(&self, column: ColumnKey) -> bool {
        let lx = column.x - self.origin.x;
        let lz = column.z - self.origin.z;
        let window = self.margin..self.size - self.margin;
        window.contains(&lx) && window.contains(&lz)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Heights stacked in a column, in insertion order.
    #[must_use]
    pub fn column(&self, column: ColumnKey) -> Option<&[i32]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    /// Strict column lookup.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ColumnNotLoaded`] outside the super-chunk.
    pub fn try_column(&self, column: ColumnKey) -> WorldResult<&[i32]> {
        self.column(column).ok_or(WorldError::ColumnNotLoaded {
            x: column.x,
            z: column.z,
        })
    }

    /// True if a voxel occupies `key`.
    #[must_use]
    pub fn contains(&self, key: VoxelKey) -> bool {
        self.column(key.column())
            .is_some_and(|heights| heights.contains(&key.y))
    }

    /// Type value of a voxel, placed material first, then the column's.
    #[must_use]
    pub fn type_value_at(&self, key: VoxelKey) -> Option<f32> {
        if !self.contains(key) {
            return None;
        }
        self.placed
            .get(&key)
            .map(|m| m.type_value())
            .or_else(|| self.natural.get(&key.column()).copied())
    }

    /// Material class of a voxel.
    #[must_use]
    pub fn material_at(&self, key: VoxelKey) -> Option<MaterialClass> {
        self.type_value_at(key).map(MaterialClass::from_type_value)
    }

    /// Buffer slot of a rendered voxel.
    #[must_use]
    pub fn cube_index(&self, key: VoxelKey) -> Option<usize> {
        self.index.get(&key.column())?.get(&key.y).copied()
    }

    /// Voxel stored at a buffer slot.
    #[must_use]
    pub fn voxel_at(&self, index: usize) -> Option<VoxelKey> {
        let start = index * POSITION_STRIDE;
        let p = self.positions.get(start..start + 3)?;
        Some(VoxelKey::new(p[0] as i32, p[1] as i32, p[2] as i32))
    }

    /// Highest voxel in a column.
    #[must_use]
    pub fn top(&self, column: ColumnKey) -> Option<i32> {
        self.column(column)?.iter().copied().max()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Pushes a natural voxel. Returns `false` if it could not be added.
    pub fn add_cube(&mut self, key: VoxelKey) -> bool {
        self.add_cube_with(key, None)
    }

    /// Pushes a voxel, optionally with a placed material.
    ///
    /// A height already present in the column is not pushed twice.
    pub fn add_cube_with(&mut self, key: VoxelKey, material: Option<MaterialClass>) -> bool {
        match self.try_add_cube(key, material) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "add_cube skipped");
                false
            }
        }
    }

    /// Strict [`add_cube_with`](Self::add_cube_with).
    ///
    /// # Errors
    ///
    /// [`WorldError::ColumnNotLoaded`] outside the super-chunk,
    /// [`WorldError::Occupied`] if the height is already stacked.
    pub fn try_add_cube(&mut self, key: VoxelKey, material: Option<MaterialClass>) -> WorldResult<()> {
        let in_window = self.in_window(key.column());
        let heights = self
            .columns
            .get_mut(&key.column())
            .ok_or(WorldError::ColumnNotLoaded { x: key.x, z: key.z })?;

        if heights.contains(&key.y) {
            return Err(WorldError::Occupied {
                x: key.x,
                y: key.y,
                z: key.z,
            });
        }

        heights.push(key.y);
        match material {
            Some(m) => {
                self.placed.insert(key, m);
            }
            None => {
                self.placed.remove(&key);
            }
        }
        if in_window {
            self.cube_count += 1;
        }
        self.stale = true;
        tracing::trace!(x = key.x, y = key.y, z = key.z, "cube added");
        Ok(())
    }

    /// Removes the first matching height. Returns `false` if absent.
    pub fn remove_cube(&mut self, key: VoxelKey) -> bool {
        match self.try_remove_cube(key) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%err, "remove_cube skipped");
                false
            }
        }
    }

    /// Strict [`remove_cube`](Self::remove_cube).
    ///
    /// # Errors
    ///
    /// [`WorldError::ColumnNotLoaded`] outside the super-chunk,
    /// [`WorldError::VoxelNotFound`] if the height is not stacked.
    pub fn try_remove_cube(&mut self, key: VoxelKey) -> WorldResult<()> {
        let in_window = self.in_window(key.column());
        let heights = self
            .columns
            .get_mut(&key.column())
            .ok_or(WorldError::ColumnNotLoaded { x: key.x, z: key.z })?;

        let slot = heights
            .iter()
            .position(|&h| h == key.y)
            .ok_or(WorldError::VoxelNotFound {
                x: key.x,
                y: key.y,
                z: key.z,
            })?;

        heights.remove(slot);
        self.placed.remove(&key);
        if in_window {
            self.cube_count -= 1;
        }
        self.stale = true;
        tracing::trace!(x = key.x, y = key.y, z = key.z, "cube removed");
        Ok(())
    }

    // =========================================================================
    // Render buffers
    // =========================================================================

    /// Rewrites the index map and both buffers from the column map.
    ///
    /// Walks the interior window row by row (`z` outer, `x` inner), each
    /// column in insertion order.
    pub fn rebuild_buffers(&mut self) {
        self.positions.clear();
        self.types.clear();
        self.index.clear();

        let mut count = 0;
        for lz in self.margin..self.size - self.margin {
            for lx in self.margin..self.size - self.margin {
                let column = self.origin.offset(lx, lz);
                let Some(heights) = self.columns.get(&column) else {
                    continue;
                };
                let natural = self.natural.get(&column).copied().unwrap_or_default();
                let slots = self.index.entry(column).or_default();

                for &h in heights {
                    let key = VoxelKey::new(column.x, h, column.z);
                    let value = self.placed.get(&key).map_or(natural, |m| m.type_value());

                    slots.insert(h, count);
                    self.positions
                        .extend_from_slice(&[column.x as f32, h as f32, column.z as f32, 0.0]);
                    self.types.push(value);
                    count += 1;
                }
            }
        }

        self.cube_count = count;
        self.stale = false;
    }

    /// True after an add/remove that has not been followed by a rebuild.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Flat position buffer, 4 floats per voxel.
    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat type buffer, 1 float per voxel.
    #[must_use]
    pub fn types(&self) -> &[f32] {
        &self.types
    }

    /// Position buffer as raw bytes.
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Type buffer as raw bytes.
    #[must_use]
    pub fn type_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.types)
    }

    /// Voxels in the interior window.
    #[must_use]
    pub const fn cube_count(&self) -> usize {
        self.cube_count
    }

    /// Sum of interior column lengths, straight from the column map.
    #[must_use]
    pub fn interior_column_total(&self) -> usize {
        self.columns
            .iter()
            .filter(|(column, _)| self.in_window(**column))
            .map(|(_, heights)| heights.len())
            .sum()
    }
}
