//! # Block Inventory
//!
//! One slot per material class. Mining credits the mined voxel's slot,
//! placing debits the selected one. Counts never go negative.

use strata_procedural::MaterialClass;

use crate::config::StartingBlocks;

/// Number of slots, one per material class.
pub const SLOT_COUNT: usize = MaterialClass::ALL.len();

/// Blocks of one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockStack {
    /// Material held in this slot.
    pub material: MaterialClass,
    /// Blocks in the stack.
    pub count: u32,
}

impl BlockStack {
    /// Creates a stack.
    #[inline]
    #[must_use]
    pub const fn new(material: MaterialClass, count: u32) -> Self {
        Self { material, count }
    }

    /// Returns true if no blocks are left.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Three fixed slots and a selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inventory {
    slots: [BlockStack; SLOT_COUNT],
    selected: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    /// Empty inventory with the first slot selected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: MaterialClass::ALL.map(|material| BlockStack::new(material, 0)),
            selected: 0,
        }
    }

    /// Inventory with configured starting counts.
    #[must_use]
    pub fn with_blocks(blocks: &StartingBlocks) -> Self {
        Self {
            slots: MaterialClass::ALL.map(|material| BlockStack::new(material, blocks.count(material))),
            selected: 0,
        }
    }

    /// Selects a slot. Returns `false` for an out-of-range slot.
    pub fn select(&mut self, slot: usize) -> bool {
        if slot >= SLOT_COUNT {
            tracing::debug!(slot, "ignoring out-of-range slot selection");
            return false;
        }
        self.selected = slot;
        true
    }

    /// Selected slot index.
    #[must_use]
    pub const fn selected_slot(&self) -> usize {
        self.selected
    }

    /// Selected stack.
    #[must_use]
    pub const fn selected(&self) -> &BlockStack {
        &self.slots[self.selected]
    }

    /// Blocks held of a material.
    #[must_use]
    pub const fn count(&self, material: MaterialClass) -> u32 {
        self.slots[material.slot()].count
    }

    /// Credits blocks of a material.
    pub fn add(&mut self, material: MaterialClass, count: u32) {
        let stack = &mut self.slots[material.slot()];
        stack.count = stack.count.saturating_add(count);
    }

    /// Takes one block from the selected slot.
    ///
    /// Returns `None`, leaving the slot untouched, if it is empty.
    pub fn take_selected(&mut self) -> Option<MaterialClass> {
        let stack = &mut self.slots[self.selected];
        if stack.is_empty() {
            return None;
        }
        stack.count -= 1;
        Some(stack.material)
    }

    /// Total blocks across all slots.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.slots.iter().map(|s| u64::from(s.count)).sum()
    }
}
