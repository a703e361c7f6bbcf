//! Error and warning types for DBPF package operations.
//!
//! This module provides the [`Error`] enum for operations that fail, the
//! [`Warning`] enum for anomalies that are reported but do not stop the
//! operation, and a convenient [`Result<T>`] type alias.
//!
//! # Fatal vs. entry-local failures
//!
//! Only a malformed package header or index aborts a whole read. Everything
//! else fails for one entry (or one property record) at a time, and callers
//! scanning a package are expected to skip that entry and carry on:
//!
//! ```rust,no_run
//! use sc4pack::{Package, Result};
//!
//! fn count_readable(path: &str) -> Result<usize> {
//!     let package = Package::open_path(path)?;
//!     let mut readable = 0;
//!     for entry in package.entries() {
//!         match package.read_decompressed(entry.key) {
//!             Ok(_) => readable += 1,
//!             Err(e) if e.is_entry_local() => log::warn!("skipping: {}", e),
//!             Err(e) => return Err(e),
//!         }
//!     }
//!     Ok(readable)
//! }
//! ```

use std::fmt;
use std::io;

use crate::key::ResourceKey;

/// Formats an optional resource key as a message prefix.
struct KeyPrefix<'a>(&'a Option<ResourceKey>);

impl fmt::Display for KeyPrefix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(key) => write!(f, "[{}] ", key),
            None => Ok(()),
        }
    }
}

/// The main error type for package, codec and property operations.
///
/// | Category | Variants | Scope |
/// |----------|----------|-------|
/// | I/O | [`Io`][Self::Io] | whole operation |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader] | whole read |
/// | Entry data | [`SizeMismatch`][Self::SizeMismatch], [`TruncatedData`][Self::TruncatedData], [`CorruptStream`][Self::CorruptStream] | one entry |
/// | Lookup | [`EntryNotFound`][Self::EntryNotFound] | one entry |
/// | Validation | [`ShapeMismatch`][Self::ShapeMismatch], [`UnsupportedFeature`][Self::UnsupportedFeature] | one resource |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading or writing a package file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data is not a DBPF package (bad magic or too short for a header),
    /// or a resource is not in the binary layout this crate decodes.
    #[error("Invalid DBPF format: {0}")]
    InvalidFormat(String),

    /// The package header or index table is structurally invalid.
    ///
    /// Raised when the index byte range falls outside the file, is too small
    /// for the declared entry count, or overlaps an entry's data.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset of the offending structure.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// The uncompressed size declared inside a compressed stream disagrees
    /// with the size expected from package metadata.
    #[error(
        "{}uncompressed size mismatch: stream declares {declared} bytes, expected {expected}",
        KeyPrefix(key)
    )]
    SizeMismatch {
        /// The entry being decoded, if known.
        key: Option<ResourceKey>,
        /// The size declared by the stream header.
        declared: usize,
        /// The size supplied by the caller.
        expected: usize,
    },

    /// A buffer ended before a complete structure could be read.
    #[error(
        "{}truncated data at offset {offset:#x}: needed {needed} bytes, {available} available",
        KeyPrefix(key)
    )]
    TruncatedData {
        /// The entry being decoded, if known.
        key: Option<ResourceKey>,
        /// The offset at which the read was attempted.
        offset: u64,
        /// Number of bytes required.
        needed: usize,
        /// Number of bytes actually available.
        available: usize,
    },

    /// A compressed stream contains an impossible instruction.
    #[error("{}corrupt compressed stream at offset {offset:#x}: {reason}", KeyPrefix(key))]
    CorruptStream {
        /// The entry being decoded, if known.
        key: Option<ResourceKey>,
        /// Input offset of the offending opcode.
        offset: u64,
        /// A description of the problem.
        reason: String,
    },

    /// No entry with the given key exists in the package.
    #[error("Entry not found: {key}")]
    EntryNotFound {
        /// The key that was looked up.
        key: ResourceKey,
    },

    /// A decoded resource does not have the shape its consumer expects.
    #[error("{}shape mismatch: {reason}", KeyPrefix(key))]
    ShapeMismatch {
        /// The resource being validated, if known.
        key: Option<ResourceKey>,
        /// What was expected and what was found.
        reason: String,
    },

    /// A recognised but unsupported variant of the format was encountered.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// Exchange records could not be serialized or parsed.
    #[cfg(feature = "exchange")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Builds a [`TruncatedData`](Self::TruncatedData) error without a key.
    pub(crate) fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        Error::TruncatedData {
            key: None,
            offset: offset as u64,
            needed,
            available,
        }
    }

    /// Attaches a resource key to errors that carry one.
    ///
    /// Keys already present are not replaced. Variants without a key slot are
    /// returned unchanged.
    pub fn with_key(mut self, resource: ResourceKey) -> Self {
        match &mut self {
            Error::SizeMismatch { key, .. }
            | Error::TruncatedData { key, .. }
            | Error::CorruptStream { key, .. }
            | Error::ShapeMismatch { key, .. } => {
                key.get_or_insert(resource);
            }
            _ => {}
        }
        self
    }

    /// Returns the resource key attached to this error, if any.
    pub fn key(&self) -> Option<ResourceKey> {
        match self {
            Error::SizeMismatch { key, .. }
            | Error::TruncatedData { key, .. }
            | Error::CorruptStream { key, .. }
            | Error::ShapeMismatch { key, .. } => *key,
            Error::EntryNotFound { key } => Some(*key),
            _ => None,
        }
    }

    /// Returns `true` if this error indicates corrupt package or entry data.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::CorruptHeader { .. }
                | Error::TruncatedData { .. }
                | Error::CorruptStream { .. }
                | Error::SizeMismatch { .. }
        )
    }

    /// Returns `true` if the failure concerns a single entry.
    ///
    /// A caller scanning every entry of a package may skip the entry and
    /// continue with its siblings. Header and I/O failures are not local.
    pub fn is_entry_local(&self) -> bool {
        matches!(
            self,
            Error::SizeMismatch { .. }
                | Error::TruncatedData { .. }
                | Error::CorruptStream { .. }
                | Error::EntryNotFound { .. }
                | Error::ShapeMismatch { .. }
                | Error::UnsupportedFeature { .. }
        )
    }
}

/// A non-fatal anomaly reported alongside a successful result.
///
/// Every warning is also emitted through the `log` facade at the point it is
/// raised.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    /// A key was seen more than once; the later occurrence wins.
    DuplicateKey {
        /// The repeated key.
        key: ResourceKey,
    },

    /// A property record has a type tag the decoder does not know.
    ///
    /// The record is kept as opaque bytes.
    UnknownPropertyType {
        /// The property id.
        property_id: u32,
        /// The unrecognised type tag.
        type_tag: u16,
        /// Offset of the record within the property block.
        offset: usize,
    },

    /// A record does not fit the canonical layout (non-zero padding) and
    /// the decoder was not allowed to reinterpret it.
    LayoutMismatch {
        /// The property id.
        property_id: u32,
        /// Offset of the record within the property block.
        offset: usize,
    },

    /// A record was reinterpreted with the wide 32-bit count layout.
    WideCountLayout {
        /// The property id.
        property_id: u32,
        /// Offset of the record within the property block.
        offset: usize,
    },

    /// Parsing of a property block stopped before the declared count.
    ParseStopped {
        /// Offset at which parsing stopped.
        offset: usize,
        /// Number of records decoded before stopping.
        decoded: usize,
        /// Number of records the block declared.
        declared: u32,
        /// Why parsing could not continue.
        reason: String,
    },

    /// An entry was left out of a merge because its bytes could not be read.
    SkippedEntry {
        /// The entry that was skipped.
        key: ResourceKey,
        /// Why it was skipped.
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DuplicateKey { key } => {
                write!(f, "duplicate key {} (later occurrence wins)", key)
            }
            Warning::UnknownPropertyType {
                property_id,
                type_tag,
                offset,
            } => write!(
                f,
                "unknown type {:#06x} for property {:#010x} at offset {:#x}; kept as raw bytes",
                type_tag, property_id, offset
            ),
            Warning::LayoutMismatch {
                property_id,
                offset,
            } => write!(
                f,
                "property {:#010x} at offset {:#x} has non-zero padding",
                property_id, offset
            ),
            Warning::WideCountLayout {
                property_id,
                offset,
            } => write!(
                f,
                "property {:#010x} at offset {:#x} decoded with 32-bit count layout",
                property_id, offset
            ),
            Warning::ParseStopped {
                offset,
                decoded,
                declared,
                reason,
            } => write!(
                f,
                "property parsing stopped at offset {:#x} after {}/{} records: {}",
                offset, decoded, declared, reason
            ),
            Warning::SkippedEntry { key, reason } => {
                write!(f, "skipped entry {}: {}", key, reason)
            }
        }
    }
}

/// A specialized Result type for package operations.
pub type Result<T> = std::result::Result<T, Error>;
