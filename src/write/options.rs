//! Write options and results.

use crate::format::header::{ContainerHeader, RESERVED_SIZE, TAIL_SIZE};
use crate::format::{INDEX_VERSION, VERSION_MAJOR, VERSION_MINOR};
use crate::timestamp::Timestamp;

/// Options for creating packages.
///
/// # Example
///
/// ```
/// use sc4pack::{Timestamp, WriteOptions};
///
/// let options = WriteOptions::new().timestamps(Timestamp::ZERO);
/// assert_eq!(options.index_version, 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Major format version written to the header.
    pub version_major: u32,
    /// Minor format version written to the header.
    pub version_minor: u32,
    /// Index table version written to the header.
    pub index_version: u32,
    /// Creation time. `None` uses the time the writer is created.
    pub created: Option<Timestamp>,
    /// Modification time. `None` uses the time the writer is created.
    pub modified: Option<Timestamp>,
    /// Header bytes 12..24, copied verbatim.
    pub reserved: [u8; RESERVED_SIZE],
    /// Header bytes 48..96, copied verbatim.
    pub tail: [u8; TAIL_SIZE],
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            index_version: INDEX_VERSION,
            created: None,
            modified: None,
            reserved: [0; RESERVED_SIZE],
            tail: [0; TAIL_SIZE],
        }
    }
}

impl WriteOptions {
    /// Creates new write options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies everything but the index fields from an existing header.
    ///
    /// Writing the entries of a parsed package in index order with these
    /// options reproduces its header byte for byte.
    pub fn from_header(header: &ContainerHeader) -> Self {
        Self {
            version_major: header.version_major,
            version_minor: header.version_minor,
            index_version: header.index_version,
            created: Some(header.created),
            modified: Some(header.modified),
            reserved: header.reserved,
            tail: header.tail,
        }
    }

    /// Sets the format version.
    pub fn version(mut self, major: u32, minor: u32) -> Self {
        self.version_major = major;
        self.version_minor = minor;
        self
    }

    /// Sets the index table version.
    pub fn index_version(mut self, version: u32) -> Self {
        self.index_version = version;
        self
    }

    /// Sets the creation time.
    pub fn created(mut self, time: Timestamp) -> Self {
        self.created = Some(time);
        self
    }

    /// Sets the modification time.
    pub fn modified(mut self, time: Timestamp) -> Self {
        self.modified = Some(time);
        self
    }

    /// Sets both timestamps. Use [`Timestamp::ZERO`] for reproducible output.
    pub fn timestamps(self, time: Timestamp) -> Self {
        self.created(time).modified(time)
    }

    /// Builds the header written by [`Writer::create`](super::Writer::create),
    /// with index fields zeroed.
    pub(crate) fn initial_header(&self) -> ContainerHeader {
        let now = Timestamp::now();
        ContainerHeader {
            version_major: self.version_major,
            version_minor: self.version_minor,
            created: self.created.unwrap_or(now),
            modified: self.modified.unwrap_or(now),
            index_version: self.index_version,
            index_count: 0,
            index_offset: 0,
            index_size: 0,
            reserved: self.reserved,
            tail: self.tail,
        }
    }
}

/// Result of a write operation.
#[must_use = "write results should be checked to ensure the package was created successfully"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of entries written.
    pub entries_written: usize,
    /// Total bytes of entry data.
    pub data_size: u64,
    /// Offset of the index table, relative to the package start.
    pub index_offset: u32,
    /// Size of the index table in bytes.
    pub index_size: u32,
    /// Total package size in bytes.
    pub total_size: u64,
}
