//! # Chunk System
//!
//! The world is addressed in 64×64-column **macro-chunks**. Terrain is always
//! synthesized for a 3×3 neighbourhood at once (a **super-chunk**, 192×192
//! columns) so that noise upsampling near a chunk edge sees the neighbour's
//! samples.
//!
//! ## Coordinates
//!
//! Macro-chunk `(cx, cz)` is centered on column `(cx*64, cz*64)` and spans
//! `[cx*64 - 32, cx*64 + 32)` on each axis. Voxel centers sit on integer
//! coordinates; a voxel at height `y` fills `[y - 0.5, y + 0.5]`.

use std::time::Instant;

use crate::noise::{combine_levels, BaseGrid, NoiseField, Pyramid};
use crate::seed::WorldSeed;

/// Macro-chunk width/depth in columns.
pub const MACRO_CHUNK_SIZE: i32 = 64;

/// Half a macro-chunk; offset from chunk center to its edge.
pub const HALF_CHUNK: i32 = MACRO_CHUNK_SIZE / 2;

/// Super-chunk width/depth in columns.
pub const SUPER_CHUNK_COLUMNS: usize = 3 * MACRO_CHUNK_SIZE as usize;

/// Highest value the type buffer carries.
pub const MAX_TYPE_VALUE: f32 = 10.0;

/// Chunk coordinate (identifies a macro-chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not columns).
    pub x: i32,
    /// Z coordinate (in chunks, not columns).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a continuous world position (the player's).
    ///
    /// Negative positions round with `ceil((v - 32) / 64)`, the rest with
    /// `floor((v + 32) / 64)`, so that the origin chunk is centered on zero.
    #[must_use]
    pub fn containing(x: f32, z: f32) -> Self {
        Self {
            x: Self::axis(x),
            z: Self::axis(z),
        }
    }

    fn axis(v: f32) -> i32 {
        let half = HALF_CHUNK as f32;
        let size = MACRO_CHUNK_SIZE as f32;
        if v < 0.0 {
            ((v - half) / size).ceil() as i32
        } else {
            ((v + half) / size).floor() as i32
        }
    }

    /// Chunk owning an integer column. Used for ledger keys.
    #[inline]
    #[must_use]
    pub const fn of_column(x: i32, z: i32) -> Self {
        Self {
            x: (x + HALF_CHUNK).div_euclid(MACRO_CHUNK_SIZE),
            z: (z + HALF_CHUNK).div_euclid(MACRO_CHUNK_SIZE),
        }
    }

    /// World column at the chunk's center.
    #[inline]
    #[must_use]
    pub const fn center_column(self) -> ColumnKey {
        ColumnKey::new(self.x * MACRO_CHUNK_SIZE, self.z * MACRO_CHUNK_SIZE)
    }

    /// Lowest-x, lowest-z column of the chunk.
    #[inline]
    #[must_use]
    pub const fn min_column(self) -> ColumnKey {
        ColumnKey::new(
            self.x * MACRO_CHUNK_SIZE - HALF_CHUNK,
            self.z * MACRO_CHUNK_SIZE - HALF_CHUNK,
        )
    }

    /// This chunk and its 8 neighbours, row-major with `-z` first.
    ///
    /// Slot 4 is always `self`.
    #[must_use]
    pub const fn neighborhood(self) -> [Self; 9] {
        let (x, z) = (self.x, self.z);
        [
            Self::new(x - 1, z - 1),
            Self::new(x, z - 1),
            Self::new(x + 1, z - 1),
            Self::new(x - 1, z),
            Self::new(x, z),
            Self::new(x + 1, z),
            Self::new(x - 1, z + 1),
            Self::new(x, z + 1),
            Self::new(x + 1, z + 1),
        ]
    }
}

/// Key of one voxel column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    /// World X.
    pub x: i32,
    /// World Z.
    pub z: i32,
}

impl ColumnKey {
    /// Creates a new column key.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Offsets the key.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// The four edge-adjacent columns: `-x`, `+x`, `-z`, `+z`.
    #[must_use]
    pub const fn cardinal_neighbors(self) -> [Self; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

/// Key of one voxel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelKey {
    /// World X.
    pub x: i32,
    /// Height.
    pub y: i32,
    /// World Z.
    pub z: i32,
}

impl VoxelKey {
    /// Creates a new voxel key.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Column this voxel stands in.
    #[inline]
    #[must_use]
    pub const fn column(self) -> ColumnKey {
        ColumnKey::new(self.x, self.z)
    }

    /// Macro-chunk owning this voxel.
    #[inline]
    #[must_use]
    pub const fn chunk(self) -> ChunkCoord {
        ChunkCoord::of_column(self.x, self.z)
    }

    /// Offsets the key.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// Visual material of a voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MaterialClass {
    /// Type value ≤ 3.
    Grass = 0,
    /// Type value in (3, 5].
    Dirt = 1,
    /// Type value > 5.
    Marble = 2,
}

impl MaterialClass {
    /// Every class, in inventory-slot order.
    pub const ALL: [Self; 3] = [Self::Grass, Self::Dirt, Self::Marble];

    /// Classifies a type-buffer value.
    #[must_use]
    pub fn from_type_value(value: f32) -> Self {
        if value > 5.0 {
            Self::Marble
        } else if value > 3.0 {
            Self::Dirt
        } else {
            Self::Grass
        }
    }

    /// Representative type-buffer value for placed voxels.
    #[must_use]
    pub const fn type_value(self) -> f32 {
        match self {
            Self::Grass => 2.0,
            Self::Dirt => 4.5,
            Self::Marble => 7.0,
        }
    }

    /// Inventory slot index.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Class stored in an inventory slot.
    #[must_use]
    pub const fn from_slot(slot: usize) -> Option<Self> {
        match slot {
            0 => Some(Self::Grass),
            1 => Some(Self::Dirt),
            2 => Some(Self::Marble),
            _ => None,
        }
    }
}

/// Synthesized heights and natural type values for one super-chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct SuperChunkTerrain {
    center: ChunkCoord,
    origin: ColumnKey,
    heights: Vec<i32>,
    materials: Vec<f32>,
}

impl SuperChunkTerrain {
    /// Wraps raw row-major grids. Both must hold `192 × 192` samples.
    #[must_use]
    pub fn new(center: ChunkCoord, heights: Vec<i32>, materials: Vec<f32>) -> Self {
        debug_assert_eq!(heights.len(), SUPER_CHUNK_COLUMNS * SUPER_CHUNK_COLUMNS);
        debug_assert_eq!(materials.len(), heights.len());
        let min = center.min_column();
        Self {
            center,
            origin: min.offset(-MACRO_CHUNK_SIZE, -MACRO_CHUNK_SIZE),
            heights,
            materials,
        }
    }

    /// Center macro-chunk.
    #[must_use]
    pub const fn center(&self) -> ChunkCoord {
        self.center
    }

    /// World column at grid index `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> ColumnKey {
        self.origin
    }

    /// Columns per side.
    #[must_use]
    pub const fn size(&self) -> usize {
        SUPER_CHUNK_COLUMNS
    }

    fn index(&self, column: ColumnKey) -> Option<usize> {
        let lx = column.x - self.origin.x;
        let lz = column.z - self.origin.z;
        let size = SUPER_CHUNK_COLUMNS as i32;
        ((0..size).contains(&lx) && (0..size).contains(&lz)).then(|| (lz * size + lx) as usize)
    }

    /// Surface height of a world column.
    #[must_use]
    pub fn height_at(&self, column: ColumnKey) -> Option<i32> {
        self.index(column).map(|i| self.heights[i])
    }

    /// Natural type value of a world column.
    #[must_use]
    pub fn material_at(&self, column: ColumnKey) -> Option<f32> {
        self.index(column).map(|i| self.materials[i])
    }

    /// Row-major surface heights.
    #[must_use]
    pub fn heights(&self) -> &[i32] {
        &self.heights
    }

    /// Row-major natural type values.
    #[must_use]
    pub fn materials(&self) -> &[f32] {
        &self.materials
    }
}

/// Chunk generator using the value-noise pyramid.
///
/// Pure: holds only the seed-derived noise field.
#[derive(Clone, Copy, Debug)]
pub struct ChunkGenerator {
    noise: NoiseField,
}

impl ChunkGenerator {
    /// Creates a new chunk generator.
    #[must_use]
    pub const fn new(seed: WorldSeed) -> Self {
        Self {
            noise: NoiseField::new(seed),
        }
    }

    /// Rolls the base octave of one macro-chunk.
    #[must_use]
    pub fn sample_base_noise(&self, coord: ChunkCoord) -> BaseGrid {
        self.noise.sample_base_noise(coord)
    }

    /// Synthesizes heights and type values for the 3×3 neighbourhood of
    /// `center`.
    #[must_use]
    pub fn synthesize_super_chunk(&self, center: ChunkCoord) -> SuperChunkTerrain {
        let start = Instant::now();

        let bases = self.noise.sample_neighborhood(center);
        let (base_heights, base_amplitudes) = NoiseField::assemble_super_base(&bases);

        let heights = combine_levels(&Pyramid::build(base_heights))
            .values()
            .iter()
            .map(|h| h.floor() as i32)
            .collect();
        let materials = combine_levels(&Pyramid::build(base_amplitudes))
            .values()
            .iter()
            .map(|a| (*a as f32).clamp(0.0, MAX_TYPE_VALUE))
            .collect();

        tracing::debug!(
            cx = center.x,
            cz = center.z,
            elapsed_us = start.elapsed().as_micros() as u64,
            "synthesized super-chunk"
        );

        SuperChunkTerrain::new(center, heights, materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_chunk_coord_containing() {
        assert_eq!(ChunkCoord::containing(0.0, 0.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(31.9, -31.9), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::containing(32.0, 95.9), ChunkCoord::new(1, 1));
        assert_eq!(ChunkCoord::containing(-32.5, -95.9), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::containing(-96.5, 96.0), ChunkCoord::new(-2, 2));
    }

    #[test]
    fn test_chunk_coord_of_column() {
        assert_eq!(ChunkCoord::of_column(0, 0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::of_column(-32, 31), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::of_column(-33, 32), ChunkCoord::new(-1, 1));
        assert_eq!(ChunkCoord::of_column(-96, -97), ChunkCoord::new(-1, -2));
    }

    #[test]
    fn test_neighborhood_order() {
        let hood = ChunkCoord::new(3, -2).neighborhood();
        assert_eq!(hood[0], ChunkCoord::new(2, -3));
        assert_eq!(hood[4], ChunkCoord::new(3, -2));
        assert_eq!(hood[8], ChunkCoord::new(4, -1));
    }

    #[test]
    fn test_material_thresholds() {
        assert_eq!(MaterialClass::from_type_value(0.0), MaterialClass::Grass);
        assert_eq!(MaterialClass::from_type_value(3.0), MaterialClass::Grass);
        assert_eq!(MaterialClass::from_type_value(3.1), MaterialClass::Dirt);
        assert_eq!(MaterialClass::from_type_value(5.0), MaterialClass::Dirt);
        assert_eq!(MaterialClass::from_type_value(5.1), MaterialClass::Marble);

        for class in MaterialClass::ALL {
            assert_eq!(MaterialClass::from_type_value(class.type_value()), class);
            assert_eq!(MaterialClass::from_slot(class.slot()), Some(class));
        }
    }

    #[test]
    fn test_super_chunk_layout() {
        let gen = ChunkGenerator::new(WorldSeed::new("42"));
        let terrain = gen.synthesize_super_chunk(ChunkCoord::new(1, -1));

        assert_eq!(terrain.origin(), ColumnKey::new(64 - 96, -64 - 96));
        assert_eq!(terrain.heights().len(), 192 * 192);
        assert!(terrain.height_at(ColumnKey::new(64, -64)).is_some());
        assert!(terrain.height_at(ColumnKey::new(64 + 96, -64)).is_none());
        assert!(terrain
            .materials()
            .iter()
            .all(|m| (0.0..=MAX_TYPE_VALUE).contains(m)));
    }

    #[test]
    fn test_super_chunk_determinism() {
        let gen1 = ChunkGenerator::new(WorldSeed::new("42"));
        let gen2 = ChunkGenerator::new(WorldSeed::new("42"));

        let coord = ChunkCoord::new(5, 10);
        assert_eq!(
            gen1.synthesize_super_chunk(coord),
            gen2.synthesize_super_chunk(coord),
            "Same seed and coordinate must give identical terrain"
        );
    }

    #[test]
    fn test_synthesis_performance() {
        let gen = ChunkGenerator::new(WorldSeed::new("42"));

        let start = Instant::now();
        for i in 0..10 {
            let _ = gen.synthesize_super_chunk(ChunkCoord::new(i, -i));
        }
        let elapsed = start.elapsed();

        println!("Synthesized 10 super-chunks in {elapsed:?}");
        assert!(
            elapsed.as_secs_f64() < 10.0,
            "Super-chunk synthesis is far too slow: {elapsed:?}"
        );
    }
}
