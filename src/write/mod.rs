//! Package writing API.
//!
//! [`Writer`] emits a package in two passes: the header is written first
//! with zeroed index fields, entry data is appended as it arrives, and
//! [`Writer::finish`] appends the index table and then seeks back to patch
//! the index count, offset and size into the header.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use sc4pack::{ResourceKey, Writer};
//!
//! let mut writer = Writer::create(Cursor::new(Vec::new()))?;
//! writer.add_entry(ResourceKey::new(1, 2, 3), b"payload")?;
//! let (result, cursor) = writer.finish_into_inner()?;
//! assert_eq!(result.entries_written, 1);
//! assert_eq!(&cursor.into_inner()[..4], b"DBPF");
//! # Ok::<(), sc4pack::Error>(())
//! ```

mod options;
mod writer_init;

pub use options::{WriteOptions, WriteResult};

use std::io::{Cursor, Seek, Write};

use crate::format::index::IndexEntry;
use crate::key::ResourceKey;
use crate::{Error, Result};

/// State of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Accepting new entries.
    AcceptingEntries,
    /// A write to the sink failed; the package is incomplete.
    Failed,
    /// The index has been written.
    Finished,
}

/// A DBPF package writer.
///
/// Entries are written in insertion order and keys are not deduplicated.
pub struct Writer<W> {
    sink: W,
    /// Stream position of the package start.
    base: u64,
    state: WriterState,
    entries: Vec<IndexEntry>,
    data_size: u64,
}

impl<W> std::fmt::Debug for Writer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("base", &self.base)
            .field("state", &self.state)
            .field("entries", &self.entries.len())
            .field("data_size", &self.data_size)
            .finish()
    }
}

impl<W: Write + Seek> Writer<W> {
    /// Appends one entry and returns its index record.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer is no longer accepting entries, the
    /// package would exceed the 32-bit offset range, or the sink fails.
    pub fn add_entry(&mut self, key: ResourceKey, data: &[u8]) -> Result<IndexEntry> {
        self.ensure_accepting_entries()?;

        let offset = self.relative_position()?;
        let entry = IndexEntry {
            key,
            offset: to_u32(offset)?,
            size: to_u32(data.len() as u64)?,
        };
        to_u32(offset + data.len() as u64)?;

        if let Err(e) = self.sink.write_all(data) {
            self.state = WriterState::Failed;
            return Err(Error::Io(e));
        }

        log::trace!("wrote {} ({} bytes) at {:#x}", key, data.len(), offset);
        self.entries.push(entry);
        self.data_size += data.len() as u64;
        Ok(entry)
    }

    /// Appends several entries in order.
    pub fn add_entries<I, D>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (ResourceKey, D)>,
        D: AsRef<[u8]>,
    {
        for (key, data) in entries {
            self.add_entry(key, data.as_ref())?;
        }
        Ok(())
    }

    /// Returns the index records written so far.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    fn relative_position(&mut self) -> Result<u64> {
        Ok(self.sink.stream_position()? - self.base)
    }
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::UnsupportedFeature {
        feature: "packages larger than 4 GiB",
    })
}

/// Writes `entries` into a new in-memory package.
///
/// # Example
///
/// ```
/// use sc4pack::{Package, ResourceKey, WriteOptions, write};
///
/// let key = ResourceKey::new(1, 2, 3);
/// let bytes = write::compose([(key, b"abc".as_slice())], &WriteOptions::default())?;
/// let package = Package::parse(bytes)?;
/// assert_eq!(package.read(key)?, b"abc");
/// # Ok::<(), sc4pack::Error>(())
/// ```
pub fn compose<I, D>(entries: I, options: &WriteOptions) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (ResourceKey, D)>,
    D: AsRef<[u8]>,
{
    let mut writer = Writer::with_options(Cursor::new(Vec::new()), options)?;
    writer.add_entries(entries)?;
    let (_, cursor) = writer.finish_into_inner()?;
    Ok(cursor.into_inner())
}
