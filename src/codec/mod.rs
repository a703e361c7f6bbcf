//! Compression codec for package entries.
//!
//! SimCity 4 packages store some entries RefPack-compressed. Such an entry is
//! wrapped in a 4-byte little-endian compressed-size prefix, after which the
//! RefPack stream begins with its `0x10 0xFB` signature. Whether an entry is
//! compressed is decided from these bytes alone; the compression directory
//! only supplies the expected uncompressed size.
//!
//! Only decompression is supported.

pub mod refpack;

pub use refpack::{StreamHeader, decode};

use crate::Result;

/// Size of the compressed-size prefix preceding the stream.
pub const WRAPPER_SIZE: usize = 4;

/// Returns the RefPack stream inside a wrapped entry, or `None` if the entry
/// is stored uncompressed.
///
/// # Example
///
/// ```
/// use sc4pack::codec;
///
/// let raw = [0x0A, 0, 0, 0, 0x10, 0xFB, 0, 0, 1, 0xFD, 0x2A];
/// let stream = codec::unwrap_entry(&raw).unwrap();
/// assert_eq!(codec::decode(stream, None).unwrap(), vec![0x2A]);
/// ```
pub fn unwrap_entry(raw: &[u8]) -> Option<&[u8]> {
    let stream = raw.get(WRAPPER_SIZE..)?;
    match stream {
        [flags, refpack::MAGIC, ..] if flags & 0xFE == 0x10 => Some(stream),
        _ => None,
    }
}

/// Returns `true` if the raw entry bytes carry the RefPack wrapper.
pub fn is_compressed(raw: &[u8]) -> bool {
    unwrap_entry(raw).is_some()
}

/// Reads the uncompressed size a stream declares, without decoding it.
pub fn declared_size(stream: &[u8]) -> Result<usize> {
    Ok(StreamHeader::parse(stream)?.uncompressed_size)
}
