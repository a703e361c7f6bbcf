//! DBPF package header structure and parsing.

use std::ops::Range;

use crate::timestamp::Timestamp;
use crate::{Error, Result};

use super::reader::u32_at;
use super::{HEADER_SIZE, INDEX_ENTRY_SIZE, INDEX_VERSION, SIGNATURE, VERSION_MAJOR, VERSION_MINOR, offsets};

/// Bytes 12..24 of the header.
pub const RESERVED_SIZE: usize = 12;

/// Bytes 48..96 of the header.
pub const TAIL_SIZE: usize = HEADER_SIZE - offsets::TAIL;

/// The fixed 96-byte header at the start of every package.
///
/// Bytes without a named field are kept in [`reserved`](Self::reserved) and
/// [`tail`](Self::tail) so a parsed header serializes back unchanged. Files
/// from other tools store user versions, flags and hole-table fields there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Package format version - major number.
    pub version_major: u32,
    /// Package format version - minor number.
    pub version_minor: u32,
    /// Creation time.
    pub created: Timestamp,
    /// Last modification time.
    pub modified: Timestamp,
    /// Index table version (7 for SimCity 4 packages).
    pub index_version: u32,
    /// Number of records in the index table.
    pub index_count: u32,
    /// Absolute byte offset of the index table.
    pub index_offset: u32,
    /// Size of the index table in bytes.
    pub index_size: u32,
    /// Bytes 12..24, between the versions and the timestamps.
    pub reserved: [u8; RESERVED_SIZE],
    /// Bytes 48..96, after the index fields.
    pub tail: [u8; TAIL_SIZE],
}

impl Default for ContainerHeader {
    fn default() -> Self {
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            created: Timestamp::ZERO,
            modified: Timestamp::ZERO,
            index_version: INDEX_VERSION,
            index_count: 0,
            index_offset: 0,
            index_size: 0,
            reserved: [0; RESERVED_SIZE],
            tail: [0; TAIL_SIZE],
        }
    }
}

impl ContainerHeader {
    /// Parses the header from the start of a package buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] if the signature does not match or the
    /// buffer is shorter than [`HEADER_SIZE`].
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < SIGNATURE.len() || &data[..SIGNATURE.len()] != SIGNATURE {
            return Err(Error::InvalidFormat("missing DBPF signature".into()));
        }
        if data.len() < HEADER_SIZE {
            return Err(Error::InvalidFormat(format!(
                "header truncated: {} of {} bytes",
                data.len(),
                HEADER_SIZE
            )));
        }

        Ok(Self {
            version_major: u32_at(data, offsets::VERSION_MAJOR)?,
            version_minor: u32_at(data, offsets::VERSION_MINOR)?,
            created: Timestamp::from_unix_secs(u32_at(data, offsets::CREATED)?),
            modified: Timestamp::from_unix_secs(u32_at(data, offsets::MODIFIED)?),
            index_version: u32_at(data, offsets::INDEX_VERSION)?,
            index_count: u32_at(data, offsets::INDEX_COUNT)?,
            index_offset: u32_at(data, offsets::INDEX_OFFSET)?,
            index_size: u32_at(data, offsets::INDEX_SIZE)?,
            reserved: copy_block(data, offsets::RESERVED),
            tail: copy_block(data, offsets::TAIL),
        })
    }

    /// Serializes the header.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[offsets::RESERVED..offsets::RESERVED + RESERVED_SIZE]
            .copy_from_slice(&self.reserved);
        out[offsets::TAIL..].copy_from_slice(&self.tail);
        let mut put = |offset: usize, value: u32| {
            out[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        };
        put(offsets::VERSION_MAJOR, self.version_major);
        put(offsets::VERSION_MINOR, self.version_minor);
        put(offsets::CREATED, self.created.as_unix_secs());
        put(offsets::MODIFIED, self.modified.as_unix_secs());
        put(offsets::INDEX_VERSION, self.index_version);
        put(offsets::INDEX_COUNT, self.index_count);
        put(offsets::INDEX_OFFSET, self.index_offset);
        put(offsets::INDEX_SIZE, self.index_size);
        out[..SIGNATURE.len()].copy_from_slice(SIGNATURE);
        out
    }

    /// Returns the byte range occupied by the index table.
    pub fn index_range(&self) -> Range<u64> {
        let start = self.index_offset as u64;
        start..start + self.index_size as u64
    }

    /// Number of bytes the declared entry count requires.
    pub fn required_index_size(&self) -> u64 {
        self.index_count as u64 * INDEX_ENTRY_SIZE as u64
    }

    /// Validates the index location against a file of `file_len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptHeader`] if the index range ends past the file
    /// or cannot hold `index_count` records.
    pub fn validate_index(&self, file_len: u64) -> Result<()> {
        let range = self.index_range();
        if range.end > file_len {
            return Err(Error::CorruptHeader {
                offset: offsets::INDEX_OFFSET as u64,
                reason: format!(
                    "index range {:#x}..{:#x} exceeds file size {:#x}",
                    range.start, range.end, file_len
                ),
            });
        }
        if self.required_index_size() > self.index_size as u64 {
            return Err(Error::CorruptHeader {
                offset: offsets::INDEX_SIZE as u64,
                reason: format!(
                    "index size {} too small for {} entries",
                    self.index_size, self.index_count
                ),
            });
        }
        Ok(())
    }
}

/// Copies `N` bytes at `offset`; the caller has checked the header length.
fn copy_block<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut block = [0u8; N];
    block.copy_from_slice(&data[offset..offset + N]);
    block
}
