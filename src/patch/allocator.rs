//! Instance id allocation for generated patches.

use super::PatchTarget;

/// First instance id handed out by [`InstanceAllocator::default`].
pub const DEFAULT_BASE: u32 = 0xFE7C_D975;

/// Start of the range used by [`InstanceAllocator::hashed`].
pub const HASHED_BASE: u32 = 0xFE7C_E000;

/// Size of the range used by [`InstanceAllocator::hashed`].
pub const HASHED_SPAN: u32 = 0x1000;

/// Hands out consecutive instance ids for one batch of patches.
///
/// # Example
///
/// ```
/// use sc4pack::patch::{InstanceAllocator, PatchTarget};
///
/// let targets = [PatchTarget::new(1, 2), PatchTarget::new(1, 3)];
/// let mut a = InstanceAllocator::hashed(&targets);
/// let mut b = InstanceAllocator::hashed(&[targets[1], targets[0]]);
/// assert_eq!(a.next_id(), b.next_id());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceAllocator {
    next: u32,
}

impl Default for InstanceAllocator {
    fn default() -> Self {
        Self::sequential(DEFAULT_BASE)
    }
}

impl InstanceAllocator {
    /// Starts at `base`.
    pub const fn sequential(base: u32) -> Self {
        Self { next: base }
    }

    /// Starts at a base derived from the batch's targets.
    ///
    /// The targets are sorted and deduplicated, flattened to little-endian
    /// `(group, instance)` bytes and hashed with CRC-32. The base is
    /// `HASHED_BASE + hash % HASHED_SPAN`, so independently generated batches
    /// rarely collide, and the same target set always maps to the same base.
    pub fn hashed(targets: &[PatchTarget]) -> Self {
        let mut sorted = targets.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut hasher = crc32fast::Hasher::new();
        for target in &sorted {
            hasher.update(&target.group_id.to_le_bytes());
            hasher.update(&target.instance_id.to_le_bytes());
        }
        let hash = hasher.finalize();
        Self::sequential(HASHED_BASE + hash % HASHED_SPAN)
    }

    /// Returns the next id without consuming it.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Returns the next id and advances.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }
}
