//! # Seeded Random Streams
//!
//! Every random value in the world comes from a [`SeededRng`] keyed by a
//! string (`"cx,cz"` for a macro-chunk, `"gx,gz biome"` for a biome corner,
//! ...) and the world's [`WorldSeed`].
//!
//! ## Determinism Guarantee
//!
//! The key is digested with SipHash-1-3 under the world seed, and the digest
//! seeds a ChaCha8 stream. Same seed + same key = same sequence, on any
//! platform, in any call order.

use std::hash::Hasher;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use siphasher::sip::SipHasher13;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a world seed from a user-facing seed string.
    #[must_use]
    pub fn new(seed: &str) -> Self {
        let mut hasher = SipHasher13::new_with_keys(0, 0);
        hasher.write(seed.as_bytes());
        Self(hasher.finish())
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., biome generation).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a style mixing
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self::new("42")
    }
}

/// Deterministic generator keyed by an arbitrary string.
///
/// # Example
///
/// ```rust
/// use strata_procedural::{SeededRng, WorldSeed};
///
/// let seed = WorldSeed::new("42");
/// let mut a = SeededRng::new(seed, "3,-1");
/// let mut b = SeededRng::new(seed, "3,-1");
/// assert_eq!(a.next(), b.next());
/// ```
pub struct SeededRng {
    rng: ChaCha8Rng,
}

impl SeededRng {
    /// Creates the stream for `key` under `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed, key: &str) -> Self {
        let mut hasher = SipHasher13::new_with_keys(seed.value(), seed.derive(1).value());
        hasher.write(key.as_bytes());
        Self {
            rng: ChaCha8Rng::seed_from_u64(hasher.finish()),
        }
    }

    /// Returns the next value in [0, 1).
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_same_stream() {
        let seed = WorldSeed::new("42");
        let mut a = SeededRng::new(seed, "0,0");
        let mut b = SeededRng::new(seed, "0,0");

        for _ in 0..64 {
            assert_eq!(a.next(), b.next(), "Streams with equal keys must match");
        }
    }

    #[test]
    fn test_different_keys_different_streams() {
        let seed = WorldSeed::new("42");
        let a: Vec<f64> = {
            let mut rng = SeededRng::new(seed, "0,0");
            (0..8).map(|_| rng.next()).collect()
        };
        let b: Vec<f64> = {
            let mut rng = SeededRng::new(seed, "0,1");
            (0..8).map(|_| rng.next()).collect()
        };

        assert_ne!(a, b, "Different keys should give different streams");
    }

    #[test]
    fn test_different_world_seeds() {
        let mut a = SeededRng::new(WorldSeed::new("42"), "0,0 biome");
        let mut b = SeededRng::new(WorldSeed::new("43"), "0,0 biome");

        assert_ne!(a.next(), b.next());
    }

    #[test]
    fn test_unit_range() {
        let mut rng = SeededRng::new(WorldSeed::default(), "range");
        for _ in 0..10_000 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v), "Value {v} out of [0, 1)");
        }
    }

    #[test]
    fn test_seed_derivation() {
        let base = WorldSeed::new("42");
        let derived1 = base.derive(1);
        let derived2 = base.derive(2);

        assert_ne!(derived1, derived2, "Different purposes should give different seeds");
        assert_eq!(derived1, base.derive(1), "Same purpose should give same seed");
        assert_ne!(derived1, base, "Derived seed should differ from base");
    }
}
