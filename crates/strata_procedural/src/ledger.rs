//! # Modification Ledger
//!
//! The sparse record of player edits. Terrain is never stored: every time a
//! super-chunk is materialized, noise is resynthesized and the ledger is
//! replayed on top.
//!
//! ## Layout
//!
//! - a per-chunk list of touched voxels, in first-touch order (replay order)
//! - a map from voxel to its current tag
//!
//! Toggling a tag (mine a placed block, re-place a mined one) rewrites the
//! map entry to [`Modification::Cleared`] and leaves the list alone, so the
//! ledger never stacks contradictory records for one voxel.
//!
//! ## Sharing
//!
//! Entries live for the whole process and outlive any world state. Wrap the
//! ledger in a [`SharedLedger`] when more than one view reads it: edits take
//! the write lock, regeneration takes the read lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::chunk::{ChunkCoord, MaterialClass, VoxelKey};
use crate::error::{WorldError, WorldResult};
use crate::world_state::VoxelWorldState;

/// Deepest the below-fill searches past earlier removals.
const MAX_FILL_DEPTH: i32 = 64;

/// Current state of one edited voxel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modification {
    /// A voxel exists here that terrain did not generate. `None` means it
    /// takes its column's natural material (anti-hole patches).
    Add(Option<MaterialClass>),
    /// A generated voxel was mined.
    Remove,
    /// An earlier add/remove was undone; replay skips it.
    Cleared,
}

/// Ledger shared between world views.
pub type SharedLedger = Arc<RwLock<ModificationLedger>>;

/// Result of a mine or place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// Material of the mined voxel, or of the placed one.
    pub material: Option<MaterialClass>,
    /// Voxels synthesized to keep the surface closed.
    pub patches: Vec<VoxelKey>,
}

/// Counters from one replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Entries applied to the world.
    pub applied: usize,
    /// Entries cleared or not applicable.
    pub skipped: usize,
}

/// Persistent add/remove overlay keyed by owning chunk.
#[derive(Debug, Default)]
pub struct ModificationLedger {
    /// Touched voxels per chunk, in first-touch order.
    order: HashMap<ChunkCoord, Vec<VoxelKey>>,
    /// Current tag per touched voxel.
    tags: HashMap<VoxelKey, Modification>,
}

impl ModificationLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty ledger behind a lock.
    #[must_use]
    pub fn shared() -> SharedLedger {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Current tag of a voxel.
    #[must_use]
    pub fn tag(&self, key: VoxelKey) -> Option<Modification> {
        self.tags.get(&key).copied()
    }

    /// Entries owned by `chunk`, in replay order.
    pub fn entries_for(&self, chunk: ChunkCoord) -> impl Iterator<Item = (VoxelKey, Modification)> + '_ {
        self.order
            .get(&chunk)
            .into_iter()
            .flatten()
            .filter_map(|key| self.tags.get(key).map(|tag| (*key, *tag)))
    }

    /// Number of voxels ever touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// True if nothing was ever edited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of entries replay would apply.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.tags
            .values()
            .filter(|tag| **tag != Modification::Cleared)
            .count()
    }

    fn record(&mut self, key: VoxelKey, tag: Modification) {
        if self.tags.insert(key, tag).is_none() {
            self.order.entry(key.chunk()).or_default().push(key);
        }
        tracing::debug!(x = key.x, y = key.y, z = key.z, ?tag, "ledger entry");
    }

    fn add_patch(&mut self, world: &mut VoxelWorldState, key: VoxelKey, patches: &mut Vec<VoxelKey>) {
        if world.add_cube(key) {
            self.record(key, Modification::Add(None));
            patches.push(key);
        }
    }

    /// Mines the voxel at `key` and rebuilds the buffers.
    ///
    /// Mining a player-placed voxel clears its record; mining a generated
    /// one records a removal. Any edge-adjacent column standing taller than
    /// the removed voxel, with no voxel and no removal at that height, gets a
    /// patch voxel so the opening does not show into the void. A column
    /// mined down to nothing is refilled just below.
    ///
    /// # Errors
    ///
    /// [`WorldError::ColumnNotLoaded`] or [`WorldError::VoxelNotFound`];
    /// the ledger and world are unchanged.
    pub fn mine(&mut self, world: &mut VoxelWorldState, key: VoxelKey) -> WorldResult<EditOutcome> {
        world.try_column(key.column())?;
        let material = world.material_at(key).ok_or(WorldError::VoxelNotFound {
            x: key.x,
            y: key.y,
            z: key.z,
        })?;

        match self.tag(key) {
            Some(Modification::Add(_)) => self.record(key, Modification::Cleared),
            _ => self.record(key, Modification::Remove),
        }
        world.try_remove_cube(key)?;

        let mut patches = Vec::new();
        for neighbor in key.column().cardinal_neighbors() {
            let exposed = world.column(neighbor).is_some_and(|heights| {
                heights.iter().any(|&h| h > key.y) && !heights.contains(&key.y)
            });
            let patch = VoxelKey::new(neighbor.x, key.y, neighbor.z);
            if exposed && self.tag(patch) != Some(Modification::Remove) {
                self.add_patch(world, patch, &mut patches);
            }
        }

        if world.column(key.column()).is_some_and(<[i32]>::is_empty) {
            let mut below = key.offset(0, -1, 0);
            while self.tag(below) == Some(Modification::Remove) && key.y - below.y < MAX_FILL_DEPTH {
                below = below.offset(0, -1, 0);
            }
            self.add_patch(world, below, &mut patches);
        }

        world.rebuild_buffers();
        Ok(EditOutcome {
            material: Some(material),
            patches,
        })
    }

    /// Places a voxel of `material` at `key` and rebuilds the buffers.
    ///
    /// Re-placing over a mined generated voxel cancels the removal, and the
    /// voxel comes back with its natural material.
    ///
    /// # Errors
    ///
    /// [`WorldError::ColumnNotLoaded`] or [`WorldError::Occupied`]; the
    /// ledger and world are unchanged.
    pub fn place_block(
        &mut self,
        world: &mut VoxelWorldState,
        key: VoxelKey,
        material: MaterialClass,
    ) -> WorldResult<EditOutcome> {
        world.try_column(key.column())?;
        if world.contains(key) {
            return Err(WorldError::Occupied {
                x: key.x,
                y: key.y,
                z: key.z,
            });
        }

        if self.tag(key) == Some(Modification::Remove) {
            self.record(key, Modification::Cleared);
            world.try_add_cube(key, None)?;
        } else {
            self.record(key, Modification::Add(Some(material)));
            world.try_add_cube(key, Some(material))?;
        }

        world.rebuild_buffers();
        Ok(EditOutcome {
            material: Some(material),
            patches: Vec::new(),
        })
    }

    /// Applies every entry of the world's 3×3 neighbourhood, chunk by chunk
    /// in insertion order. Does not rebuild the buffers.
    pub fn replay(&self, world: &mut VoxelWorldState) -> ReplayStats {
        let mut stats = ReplayStats::default();

        for chunk in world.center().neighborhood() {
            for (key, tag) in self.entries_for(chunk) {
                let applied = match tag {
                    Modification::Add(material) => world.add_cube_with(key, material),
                    Modification::Remove => world.remove_cube(key),
                    Modification::Cleared => false,
                };
                if applied {
                    stats.applied += 1;
                } else {
                    stats.skipped += 1;
                }
            }
        }

        stats
    }
}
