//! The compression directory resource.
//!
//! Packages that contain compressed entries carry one resource of type
//! [`DIRECTORY`](crate::format::type_id::DIRECTORY) listing the uncompressed
//! size of every compressed entry. Each record is 16 bytes: the entry's
//! type, group and instance ids followed by its uncompressed size, all
//! little-endian u32.

use std::collections::HashMap;

use crate::Result;
use crate::format::reader::ByteReader;
use crate::key::ResourceKey;

/// Size of one directory record in bytes.
pub const DIRECTORY_RECORD_SIZE: usize = 16;

/// Uncompressed sizes of the compressed entries in a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionDirectory {
    sizes: HashMap<ResourceKey, u32>,
}

impl CompressionDirectory {
    /// Parses the directory resource payload.
    ///
    /// A trailing partial record is a [`TruncatedData`](crate::Error::TruncatedData)
    /// error. Repeated keys keep the last size.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);
        let mut sizes = HashMap::with_capacity(data.len() / DIRECTORY_RECORD_SIZE);
        while !r.is_empty() {
            let key = ResourceKey::from_le_bytes(r.read_array()?);
            let size = r.read_u32_le()?;
            sizes.insert(key, size);
        }
        Ok(Self { sizes })
    }

    /// Returns the uncompressed size recorded for `key`.
    pub fn get(&self, key: ResourceKey) -> Option<u32> {
        self.sizes.get(&key).copied()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns `true` if the directory lists no entries.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Iterates over `(key, uncompressed size)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKey, u32)> + '_ {
        self.sizes.iter().map(|(k, v)| (*k, *v))
    }

    /// Records the uncompressed size of a compressed entry.
    pub fn insert(&mut self, key: ResourceKey, size: u32) {
        self.sizes.insert(key, size);
    }

    /// Serializes the directory with records sorted by key.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut records: Vec<_> = self.iter().collect();
        records.sort_unstable();
        let mut out = Vec::with_capacity(records.len() * DIRECTORY_RECORD_SIZE);
        for (key, size) in records {
            out.extend_from_slice(&key.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }
        out
    }
}
