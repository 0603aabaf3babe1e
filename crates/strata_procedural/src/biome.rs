//! # Biome Blending
//!
//! Decides the `(amplitude, center)` pair that drives every base-octave
//! sample.
//!
//! Two lattices are rolled, both in base-cell units:
//! - a 2-cell **biome** lattice, one regular roll per corner
//!   (key `"gx,gz biome"`),
//! - a 4-cell **super-biome** lattice (key `"gx,gz superbiome"`) whose rare
//!   rolls upgrade the biome corners around them to mountains.
//!
//! A base cell's sample is the Hermite blend of its four biome corners,
//! first along x, then along z.

use crate::seed::{SeededRng, WorldSeed};

/// Spacing of the biome lattice, in base cells.
pub const BIOME_SPACING: i32 = 2;

/// Spacing of the super-biome lattice, in base cells.
pub const SUPER_BIOME_SPACING: i32 = 4;

/// Chance that a super-biome corner rolls a mountain.
pub const MOUNTAIN_CHANCE: f64 = 0.2;

/// Amplitude of a mountain corner.
pub const MOUNTAIN_AMPLITUDE: f64 = 10.0;

/// Center a mountain is pulled toward when a neighbouring super cell disagrees.
pub const NEUTRAL_CENTER: f64 = 30.0;

/// Terrain classes a biome corner can roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BiomeClass {
    /// Low, nearly flat grassland.
    Plains = 0,
    /// Rolling dirt hills.
    Hills = 1,
    /// Raised rocky plateaus.
    Highlands = 2,
    /// Rare high-amplitude peaks from the super-biome lattice.
    Mountains = 3,
}

/// One biome tuple: class, noise amplitude, and height center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeSample {
    /// Dominant class.
    pub class: BiomeClass,
    /// Spread of the base-octave samples.
    pub amplitude: f64,
    /// Height the base-octave samples sit on.
    pub center: f64,
}

impl BiomeSample {
    /// Hermite-interpolates two samples. The class follows the nearer one.
    #[must_use]
    pub fn blend(a: Self, b: Self, w: f64) -> Self {
        Self {
            class: if w < 0.5 { a.class } else { b.class },
            amplitude: smoothstep(a.amplitude, b.amplitude, w),
            center: smoothstep(a.center, b.center, w),
        }
    }
}

/// Hermite smoothstep between `a` and `b`.
#[inline]
#[must_use]
pub fn smoothstep(a: f64, b: f64, w: f64) -> f64 {
    (b - a) * (3.0 - 2.0 * w) * w * w + a
}

/// Samples and blends biome tuples on the global base-cell grid.
#[derive(Clone, Copy, Debug)]
pub struct BiomeBlender {
    seed: WorldSeed,
}

impl BiomeBlender {
    /// Creates a blender for a world seed.
    #[must_use]
    pub const fn new(seed: WorldSeed) -> Self {
        Self { seed }
    }

    /// Returns the blended biome tuple for base cell `(gx, gz)`.
    #[must_use]
    pub fn sample(&self, gx: i32, gz: i32) -> BiomeSample {
        let bx = gx.div_euclid(BIOME_SPACING) * BIOME_SPACING;
        let bz = gz.div_euclid(BIOME_SPACING) * BIOME_SPACING;

        // Cell centers sit at 1/4 and 3/4 of the biome cell.
        let wx = (f64::from(gx - bx) + 0.5) / f64::from(BIOME_SPACING);
        let wz = (f64::from(gz - bz) + 0.5) / f64::from(BIOME_SPACING);

        let c00 = self.corner(bx, bz);
        let c10 = self.corner(bx + BIOME_SPACING, bz);
        let c01 = self.corner(bx, bz + BIOME_SPACING);
        let c11 = self.corner(bx + BIOME_SPACING, bz + BIOME_SPACING);

        let top = BiomeSample::blend(c00, c10, wx);
        let bottom = BiomeSample::blend(c01, c11, wx);
        BiomeSample::blend(top, bottom, wz)
    }

    /// Resolves one biome-lattice corner, including the super-biome upgrade.
    #[must_use]
    pub fn corner(&self, gx: i32, gz: i32) -> BiomeSample {
        // Nearest super corner, ties resolved upward.
        let half = SUPER_BIOME_SPACING / 2;
        let sx = (gx + half).div_euclid(SUPER_BIOME_SPACING) * SUPER_BIOME_SPACING;
        let sz = (gz + half).div_euclid(SUPER_BIOME_SPACING) * SUPER_BIOME_SPACING;

        match self.super_roll(sx, sz) {
            Some(center) => {
                let neighbours = [
                    (sx - SUPER_BIOME_SPACING, sz),
                    (sx + SUPER_BIOME_SPACING, sz),
                    (sx, sz - SUPER_BIOME_SPACING),
                    (sx, sz + SUPER_BIOME_SPACING),
                ];
                let isolated = neighbours
                    .iter()
                    .any(|&(nx, nz)| self.super_roll(nx, nz).is_none());
                let center = if isolated {
                    (center + NEUTRAL_CENTER) * 0.5
                } else {
                    center
                };
                BiomeSample {
                    class: BiomeClass::Mountains,
                    amplitude: MOUNTAIN_AMPLITUDE,
                    center,
                }
            }
            None => self.regular_roll(gx, gz),
        }
    }

    /// Regular biome roll for a corner of the 2-cell lattice.
    fn regular_roll(&self, gx: i32, gz: i32) -> BiomeSample {
        let mut rng = SeededRng::new(self.seed, &format!("{gx},{gz} biome"));
        let class_roll = rng.next();
        let center_roll = rng.next();

        if class_roll < 0.45 {
            BiomeSample {
                class: BiomeClass::Plains,
                amplitude: 2.0,
                center: 24.0 + 6.0 * center_roll,
            }
        } else if class_roll < 0.8 {
            BiomeSample {
                class: BiomeClass::Hills,
                amplitude: 4.5,
                center: 28.0 + 8.0 * center_roll,
            }
        } else {
            BiomeSample {
                class: BiomeClass::Highlands,
                amplitude: 7.0,
                center: 34.0 + 8.0 * center_roll,
            }
        }
    }

    /// Super-biome roll: `Some(center)` when the corner is a mountain.
    fn super_roll(&self, sx: i32, sz: i32) -> Option<f64> {
        let mut rng = SeededRng::new(self.seed, &format!("{sx},{sz} superbiome"));
        let chance = rng.next();
        let center_roll = rng.next();
        (chance < MOUNTAIN_CHANCE).then(|| 70.0 + 20.0 * center_roll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(2.0, 10.0, 0.0), 2.0);
        assert_eq!(smoothstep(2.0, 10.0, 1.0), 10.0);
        assert_eq!(smoothstep(2.0, 10.0, 0.5), 6.0);
    }

    #[test]
    fn test_biome_determinism() {
        let a = BiomeBlender::new(WorldSeed::new("42"));
        let b = BiomeBlender::new(WorldSeed::new("42"));

        for i in -50..50 {
            let (gx, gz) = (i * 3, i * -7);
            assert_eq!(
                a.sample(gx, gz),
                b.sample(gx, gz),
                "Biome blend should be deterministic at ({gx}, {gz})"
            );
        }
    }

    #[test]
    fn test_blend_stays_within_corner_range() {
        let blender = BiomeBlender::new(WorldSeed::new("blend"));

        for gz in -20..20 {
            for gx in -20..20 {
                let sample = blender.sample(gx, gz);
                assert!(
                    (2.0..=MOUNTAIN_AMPLITUDE).contains(&sample.amplitude),
                    "Amplitude {} out of range at ({gx}, {gz})",
                    sample.amplitude
                );
                assert!(
                    (24.0..=90.0).contains(&sample.center),
                    "Center {} out of range at ({gx}, {gz})",
                    sample.center
                );
            }
        }
    }

    #[test]
    fn test_mountains_are_rare_but_present() {
        let blender = BiomeBlender::new(WorldSeed::new("12345"));
        let mut mountains = 0;
        let mut total = 0;

        for gz in (-400..400).step_by(2) {
            for gx in (-400..400).step_by(2) {
                if blender.corner(gx, gz).class == BiomeClass::Mountains {
                    mountains += 1;
                }
                total += 1;
            }
        }

        let share = f64::from(mountains) / f64::from(total);
        println!("Mountain corner share: {:.1}%", share * 100.0);
        assert!(share > 0.1 && share < 0.3, "Mountain share {share} far from 20%");
    }

    #[test]
    fn test_isolated_mountain_is_softened() {
        let blender = BiomeBlender::new(WorldSeed::new("soft"));

        for gz in (-200..200).step_by(4) {
            for gx in (-200..200).step_by(4) {
                let corner = blender.corner(gx, gz);
                if corner.class == BiomeClass::Mountains {
                    assert!(
                        corner.center >= (70.0 + NEUTRAL_CENTER) * 0.5,
                        "Mountain center {} below softened floor",
                        corner.center
                    );
                }
            }
        }
    }
}
