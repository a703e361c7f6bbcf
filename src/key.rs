//! Resource keys (type, group, instance) identifying package entries.

use std::fmt;

/// The (type, group, instance) triple that identifies a resource.
///
/// Keys are unique within one package index. They order by type, then group,
/// then instance.
///
/// # Example
///
/// ```
/// use sc4pack::ResourceKey;
///
/// let key = ResourceKey::new(0x6534_284A, 0xA8FB_D372, 0x6A63_633B);
/// assert_eq!(key.to_string(), "T:0x6534284A G:0xA8FBD372 I:0x6A63633B");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    /// Resource type id.
    pub type_id: u32,
    /// Group id.
    pub group_id: u32,
    /// Instance id.
    pub instance_id: u32,
}

impl ResourceKey {
    /// Size of an encoded key in bytes.
    pub const SIZE: usize = 12;

    /// Creates a key from its three components.
    pub const fn new(type_id: u32, group_id: u32, instance_id: u32) -> Self {
        Self {
            type_id,
            group_id,
            instance_id,
        }
    }

    /// Decodes a key from 12 little-endian bytes.
    pub fn from_le_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let word = |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Self::new(word(0), word(4), word(8))
    }

    /// Encodes the key as 12 little-endian bytes.
    pub fn to_le_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.type_id.to_le_bytes());
        out[4..8].copy_from_slice(&self.group_id.to_le_bytes());
        out[8..12].copy_from_slice(&self.instance_id.to_le_bytes());
        out
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T:{:#010X} G:{:#010X} I:{:#010X}",
            self.type_id, self.group_id, self.instance_id
        )
    }
}

impl From<(u32, u32, u32)> for ResourceKey {
    fn from((type_id, group_id, instance_id): (u32, u32, u32)) -> Self {
        Self::new(type_id, group_id, instance_id)
    }
}
