//! # sc4pack
//!
//! A pure-Rust library for reading and writing DBPF resource packages as used
//! by SimCity 4 plugins.
//!
//! The crate covers the container (header, index and compression directory),
//! the RefPack decompressor used for compressed entries, the property blocks
//! stored in Exemplar and Cohort resources, and generation of exemplar patches
//! that override a property on many lots at once.
//!
//! ## Quick Start
//!
//! ### Reading a Package
//!
//! ```rust,no_run
//! use sc4pack::{Package, Result};
//! use sc4pack::exemplar::{self, DecodeOptions};
//! use sc4pack::format::type_id;
//!
//! fn main() -> Result<()> {
//!     let package = Package::open_path("plugin.dat")?;
//!     for warning in package.warnings() {
//!         eprintln!("warning: {}", warning);
//!     }
//!
//!     for entry in package.entries() {
//!         if entry.key.type_id != type_id::EXEMPLAR {
//!             continue;
//!         }
//!         let bytes = package.read_decompressed(entry.key)?;
//!         let (_, block) = exemplar::decode_resource(&bytes, &DecodeOptions::default())?;
//!         println!("{}: {} properties", entry.key, block.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Writing a Package
//!
//! ```rust
//! use sc4pack::{Package, ResourceKey, Timestamp, WriteOptions, Writer};
//! use std::io::Cursor;
//!
//! let options = WriteOptions::default().timestamps(Timestamp::from_unix_secs(1_700_000_000));
//! let mut writer = Writer::with_options(Cursor::new(Vec::new()), &options)?;
//! writer.add_entry(ResourceKey::new(1, 2, 3), b"payload")?;
//! let (result, sink) = writer.finish_into_inner()?;
//! assert_eq!(result.entries_written, 1);
//!
//! let package = Package::parse(sink.into_inner())?;
//! assert_eq!(package.read(ResourceKey::new(1, 2, 3))?, b"payload");
//! # Ok::<(), sc4pack::Error>(())
//! ```
//!
//! ### Merging Packages
//!
//! Later packages override earlier ones key by key:
//!
//! ```rust
//! use sc4pack::{Merger, Package, ResourceKey, WriteOptions, write};
//!
//! let key = ResourceKey::new(1, 2, 3);
//! let base = Package::parse(write::compose([(key, b"old".to_vec())], &WriteOptions::default())?)?;
//! let update = Package::parse(write::compose([(key, b"new".to_vec())], &WriteOptions::default())?)?;
//!
//! let merged = Merger::new().add(&base).add(&update).finish();
//! assert_eq!(merged.warnings.len(), 1);
//! let package = Package::parse(merged.to_bytes(&WriteOptions::default())?)?;
//! assert_eq!(package.read(key)?, b"new");
//! # Ok::<(), sc4pack::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `exchange` | Yes | JSON exchange records for decoded exemplars |
//!
//! ## Error Handling
//!
//! Operations return [`Result<T>`], an alias for `std::result::Result<T, Error>`.
//! Problems that do not prevent reading, such as duplicate keys or unknown
//! property types, are collected as [`Warning`]s instead and logged through
//! the [`log`](https://docs.rs/log) facade.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod codec;
pub mod error;
pub mod exemplar;
pub mod format;
pub mod key;
pub mod patch;
pub mod read;
pub mod timestamp;
pub mod write;

#[cfg(feature = "exchange")]
#[cfg_attr(docsrs, doc(cfg(feature = "exchange")))]
pub mod exchange;

pub use error::{Error, Result, Warning};
pub use key::ResourceKey;
pub use timestamp::Timestamp;

// Re-export container types at crate root for convenience
pub use format::header::ContainerHeader;
pub use format::index::IndexEntry;

// Re-export reading API at crate root for convenience
pub use read::{CompressionDirectory, MergeResult, Merger, Package};

// Re-export writing API at crate root for convenience
pub use write::{WriteOptions, WriteResult, Writer};
