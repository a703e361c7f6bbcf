//! Index table records.

use std::ops::Range;

use crate::key::ResourceKey;
use crate::Result;

use super::INDEX_ENTRY_SIZE;
use super::reader::ByteReader;

/// One record of the package index: a key plus the location of its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexEntry {
    /// Resource key.
    pub key: ResourceKey,
    /// Absolute byte offset of the entry data.
    pub offset: u32,
    /// Length of the entry data in bytes (as stored, possibly compressed).
    pub size: u32,
}

impl IndexEntry {
    /// Reads one 20-byte index record.
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        let key = ResourceKey::from_le_bytes(r.read_array()?);
        let offset = r.read_u32_le()?;
        let size = r.read_u32_le()?;
        Ok(Self { key, offset, size })
    }

    /// Encodes the record as 20 little-endian bytes.
    pub fn to_bytes(&self) -> [u8; INDEX_ENTRY_SIZE] {
        let mut out = [0u8; INDEX_ENTRY_SIZE];
        out[..ResourceKey::SIZE].copy_from_slice(&self.key.to_le_bytes());
        out[12..16].copy_from_slice(&self.offset.to_le_bytes());
        out[16..20].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    /// Returns the declared byte range of the entry data.
    pub fn range(&self) -> Range<u64> {
        let start = self.offset as u64;
        start..start + self.size as u64
    }

    /// Returns `true` if the entry's data range intersects `other`.
    ///
    /// Empty ranges never overlap anything.
    pub fn overlaps(&self, other: &Range<u64>) -> bool {
        let own = self.range();
        !own.is_empty() && !other.is_empty() && own.start < other.end && other.start < own.end
    }
}
