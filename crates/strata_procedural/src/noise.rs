//! # Value-Noise Pyramid
//!
//! Height synthesis for one super-chunk (3×3 macro-chunks):
//!
//! ```text
//! 9 × base octave (8×8)  ──assemble──►  super base (24×24)
//!                                            │ upsample ×2
//!                                            ▼
//!                                        48×48 ─► 96×96 ─► 192×192
//!
//! height = floor(0.125·L0 + 0.125·L1 + 0.25·L2 + 0.5·L3)
//! ```
//!
//! Each base octave is rolled from the macro-chunk's own RNG stream, so the
//! super base seen by two neighbouring super-chunks is identical where they
//! overlap. Upsampling the assembled 24×24 grid (instead of each 8×8 grid on
//! its own) is what keeps terrain continuous across chunk edges.
//!
//! ## Determinism Guarantee
//!
//! Same seed + same chunk coordinate = bit-identical output, every call.

use crate::biome::BiomeBlender;
use crate::chunk::ChunkCoord;
use crate::seed::{SeededRng, WorldSeed};

/// Samples per side of one macro-chunk's base octave.
pub const BASE_RESOLUTION: usize = 8;

/// Samples per side of the assembled super base.
pub const SUPER_BASE_RESOLUTION: usize = BASE_RESOLUTION * 3;

/// Number of doublings from the super base to one sample per column.
pub const UPSAMPLE_PASSES: usize = 3;

/// Per-level weights, coarsest first. Finest-weighted-most, summing to 1.
pub const LEVEL_WEIGHTS: [f64; UPSAMPLE_PASSES + 1] = [0.125, 0.125, 0.25, 0.5];

/// A dense row-major grid of samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: usize,
    depth: usize,
    values: Vec<f64>,
}

impl Grid {
    /// Creates a zeroed `width × depth` grid.
    #[must_use]
    pub fn new(width: usize, depth: usize) -> Self {
        Self {
            width,
            depth,
            values: vec![0.0; width * depth],
        }
    }

    /// Creates a zeroed square grid.
    #[must_use]
    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    /// Samples along x.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Samples along z.
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Reads the sample at `(x, z)`.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> f64 {
        self.values[z * self.width + x]
    }

    /// Writes the sample at `(x, z)`.
    #[inline]
    pub fn set(&mut self, x: usize, z: usize, value: f64) {
        self.values[z * self.width + x] = value;
    }

    /// Raw row-major samples.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// One macro-chunk's base octave: heights plus the biome amplitude that
/// shaped them (the amplitude later becomes the material value).
#[derive(Clone, Debug, PartialEq)]
pub struct BaseGrid {
    /// `floor(amplitude * rng + center)` per cell.
    pub heights: Grid,
    /// Blended biome amplitude per cell.
    pub amplitudes: Grid,
}

/// Upsampled levels for one super-chunk, coarsest first.
#[derive(Clone, Debug)]
pub struct Pyramid {
    /// `levels[0]` is the 24×24 super base, `levels[3]` is 192×192.
    pub levels: [Grid; UPSAMPLE_PASSES + 1],
}

impl Pyramid {
    /// Builds every level from an assembled super base.
    #[must_use]
    pub fn build(base: Grid) -> Self {
        let l1 = upsample(&base);
        let l2 = upsample(&l1);
        let l3 = upsample(&l2);
        Self {
            levels: [base, l1, l2, l3],
        }
    }

    /// Samples per side at the finest level.
    #[must_use]
    pub fn resolution(&self) -> usize {
        self.levels[UPSAMPLE_PASSES].width()
    }

    /// Weighted sum across levels at finest-level position `(x, z)`.
    ///
    /// Coarser levels are read at the cell covering `(x, z)`.
    #[must_use]
    pub fn combined(&self, x: usize, z: usize) -> f64 {
        self.levels
            .iter()
            .zip(LEVEL_WEIGHTS)
            .enumerate()
            .map(|(level, (grid, weight))| {
                let shift = UPSAMPLE_PASSES - level;
                weight * grid.get(x >> shift, z >> shift)
            })
            .sum()
    }
}

/// 2× upsampling with the separable [1,3,3,1]/16 stencil.
///
/// Applied once along x and once along z, so every output cell takes 9/16
/// of its parent, 3/16 of each edge-adjacent parent and 1/16 of the corner
/// parent. Indices past the border clamp to the edge sample.
#[must_use]
pub fn upsample(grid: &Grid) -> Grid {
    let (w, d) = (grid.width(), grid.depth());

    let mut wide = Grid::new(w * 2, d);
    for z in 0..d {
        for x in 0..w * 2 {
            let (near, far) = stencil_taps(x, w);
            wide.set(x, z, 0.75 * grid.get(near, z) + 0.25 * grid.get(far, z));
        }
    }

    let mut out = Grid::new(w * 2, d * 2);
    for z in 0..d * 2 {
        let (near, far) = stencil_taps(z, d);
        for x in 0..w * 2 {
            out.set(x, z, 0.75 * wide.get(x, near) + 0.25 * wide.get(x, far));
        }
    }

    out
}

/// Collapses a pyramid into one finest-resolution grid of weighted sums.
#[must_use]
pub fn combine_levels(pyramid: &Pyramid) -> Grid {
    let size = pyramid.resolution();
    let mut out = Grid::square(size);
    for z in 0..size {
        for x in 0..size {
            out.set(x, z, pyramid.combined(x, z));
        }
    }
    out
}

/// Parent indices feeding output index `out` along one axis of length `len`.
#[inline]
fn stencil_taps(out: usize, len: usize) -> (usize, usize) {
    let near = out / 2;
    let far = if out % 2 == 0 {
        near.saturating_sub(1)
    } else {
        (near + 1).min(len - 1)
    };
    (near, far)
}

/// Deterministic height and biome signal for super-chunks.
#[derive(Clone, Copy, Debug)]
pub struct NoiseField {
    seed: WorldSeed,
    biomes: BiomeBlender,
}

impl NoiseField {
    /// Creates a noise field from a world seed.
    #[must_use]
    pub const fn new(seed: WorldSeed) -> Self {
        Self {
            seed,
            biomes: BiomeBlender::new(seed),
        }
    }

    /// Returns the world seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Returns the biome blender.
    #[must_use]
    pub const fn biomes(&self) -> &BiomeBlender {
        &self.biomes
    }

    /// Rolls the 8×8 base octave of one macro-chunk.
    ///
    /// The stream is keyed by `"cx,cz"`; cells are drawn row by row.
    #[must_use]
    pub fn sample_base_noise(&self, coord: ChunkCoord) -> BaseGrid {
        let mut rng = SeededRng::new(self.seed, &format!("{},{}", coord.x, coord.z));
        let mut heights = Grid::square(BASE_RESOLUTION);
        let mut amplitudes = Grid::square(BASE_RESOLUTION);

        let res = BASE_RESOLUTION as i32;
        for z in 0..BASE_RESOLUTION {
            for x in 0..BASE_RESOLUTION {
                let gx = coord.x * res + x as i32;
                let gz = coord.z * res + z as i32;
                let biome = self.biomes.sample(gx, gz);

                heights.set(x, z, (biome.amplitude * rng.next() + biome.center).floor());
                amplitudes.set(x, z, biome.amplitude);
            }
        }

        BaseGrid {
            heights,
            amplitudes,
        }
    }

    /// Base octaves of `center` and its 8 neighbours, in
    /// [`ChunkCoord::neighborhood`] order.
    #[must_use]
    pub fn sample_neighborhood(&self, center: ChunkCoord) -> [BaseGrid; 9] {
        center.neighborhood().map(|coord| self.sample_base_noise(coord))
    }

    /// Stitches nine base octaves into the 24×24 super base.
    ///
    /// `bases` is in [`ChunkCoord::neighborhood`] order (row-major, `-z` first).
    /// Returns `(heights, amplitudes)`.
    #[must_use]
    pub fn assemble_super_base(bases: &[BaseGrid; 9]) -> (Grid, Grid) {
        let mut heights = Grid::square(SUPER_BASE_RESOLUTION);
        let mut amplitudes = Grid::square(SUPER_BASE_RESOLUTION);

        for (slot, base) in bases.iter().enumerate() {
            let ox = (slot % 3) * BASE_RESOLUTION;
            let oz = (slot / 3) * BASE_RESOLUTION;
            for z in 0..BASE_RESOLUTION {
                for x in 0..BASE_RESOLUTION {
                    heights.set(ox + x, oz + z, base.heights.get(x, z));
                    amplitudes.set(ox + x, oz + z, base.amplitudes.get(x, z));
                }
            }
        }

        (heights, amplitudes)
    }
}
