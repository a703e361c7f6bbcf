//! DBPF package format constants, definitions, and low-level parsing utilities.
//!
//! This module contains the magic numbers, fixed sizes and well-known
//! resource ids of the DBPF container used by SimCity 4.

pub mod header;
pub mod index;
pub mod reader;

/// The DBPF file signature (magic bytes).
pub const SIGNATURE: &[u8; 4] = b"DBPF";

/// Size of the fixed package header in bytes.
///
/// The header contains:
/// - 4 bytes: signature
/// - 8 bytes: version (major, minor)
/// - 12 bytes: reserved
/// - 8 bytes: created/modified timestamps
/// - 4 bytes: index version
/// - 4 bytes: index entry count
/// - 4 bytes: index offset
/// - 4 bytes: index size
/// - 48 bytes: reserved
pub const HEADER_SIZE: usize = 96;

/// Size of one index table record in bytes (key + offset + size).
pub const INDEX_ENTRY_SIZE: usize = 20;

/// Package version written by default - major.
pub const VERSION_MAJOR: u32 = 1;

/// Package version written by default - minor.
pub const VERSION_MINOR: u32 = 0;

/// Index table version written by default.
pub const INDEX_VERSION: u32 = 7;

/// Byte offsets of the header fields.
pub mod offsets {
    /// Major version.
    pub const VERSION_MAJOR: usize = 4;
    /// Minor version.
    pub const VERSION_MINOR: usize = 8;
    /// Creation timestamp.
    pub const CREATED: usize = 24;
    /// Modification timestamp.
    pub const MODIFIED: usize = 28;
    /// Index table version.
    pub const INDEX_VERSION: usize = 32;
    /// Number of index entries.
    pub const INDEX_COUNT: usize = 36;
    /// Absolute offset of the index table.
    pub const INDEX_OFFSET: usize = 40;
    /// Size of the index table in bytes.
    pub const INDEX_SIZE: usize = 44;
    /// Start of the reserved block before the timestamps.
    pub const RESERVED: usize = 12;
    /// Start of the trailing block after the index fields.
    pub const TAIL: usize = 48;
}

/// Resource type ids.
pub mod type_id {
    /// Exemplar resources (typed property lists).
    pub const EXEMPLAR: u32 = 0x6534_284A;
    /// Cohort resources (exemplar parents, also used for exemplar patches).
    pub const COHORT: u32 = 0x0534_2861;
    /// Compression directory listing uncompressed sizes of compressed entries.
    pub const DIRECTORY: u32 = 0xE86B_1EEF;
}

/// Group ids.
pub mod group_id {
    /// Group that marks a cohort as an exemplar patch.
    pub const EXEMPLAR_PATCH: u32 = 0xB036_97D1;
    /// Group shared by all lot configuration exemplars.
    pub const LOT_CONFIGURATION: u32 = 0xA8FB_D372;
    /// Group of the compression directory.
    pub const DIRECTORY: u32 = 0xE86B_1EEF;
}

/// Instance ids.
pub mod instance_id {
    /// Instance of the compression directory.
    pub const DIRECTORY: u32 = 0x286B_1F03;
}

/// Key of the compression directory resource.
pub const DIRECTORY_KEY: crate::key::ResourceKey =
    crate::key::ResourceKey::new(type_id::DIRECTORY, group_id::DIRECTORY, instance_id::DIRECTORY);
