//! Two-stage slot hashing for the dictionary store.
//!
//! A key is first folded into a raw value with a multiply-and-mod
//! polynomial over its bytes, then mapped through a permutation table that
//! is shuffled once per store. Keys crafted to collide under the raw fold
//! still share a slot, but the slot they land in differs from store to
//! store, and the ordering of raw values says nothing about slot ordering.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{PslError, Result};

/// Number of slots in a store's table.
pub const TABLE_SIZE: usize = 0x10001;

/// Number of entries in the permutation table (every possible raw fold).
pub const PERMUTATION_SIZE: usize = TABLE_SIZE - 1;

/// Fold a key into a raw hash in `[0, PERMUTATION_SIZE)`.
pub fn fold(key: &[u8]) -> usize {
    let mut j: u64 = 1;
    for &b in key {
        j *= u64::from(b);
        j = (j % TABLE_SIZE as u64) & 0xFFFF;
    }
    j as usize
}

/// Random permutation mapping raw folds to slot indices.
#[derive(Debug, Clone)]
pub struct SlotPermutation {
    table: Vec<u16>,
}

impl SlotPermutation {
    /// Build a permutation by uniformly shuffling the identity table.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut table: Vec<u16> = Vec::new();
        table.try_reserve_exact(PERMUTATION_SIZE).map_err(|e| {
            PslError::AllocationFailure(format!("Can not allocate permutation table: {}", e))
        })?;
        // PERMUTATION_SIZE - 1 == u16::MAX
        table.extend((0..PERMUTATION_SIZE).map(|i| i as u16));
        table.shuffle(rng);
        Ok(Self { table })
    }

    /// Slot index for a key.
    #[inline]
    pub fn slot(&self, key: &str) -> usize {
        self.table[fold(key.as_bytes())] as usize
    }
}
