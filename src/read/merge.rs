//! Merging several packages into one.
//!
//! Later packages override earlier ones: when a key is added again, its bytes
//! are replaced but it keeps the position of its first occurrence. Every
//! override is reported as a [`Warning::DuplicateKey`].
//!
//! Compressed entries are copied as stored. The compression directories of
//! the inputs are not copied; a fresh directory covering the merged
//! compressed entries is appended when the result is written.

use std::collections::HashMap;

use crate::codec;
use crate::error::Warning;
use crate::format::{DIRECTORY_KEY, type_id};
use crate::key::ResourceKey;
use crate::write::{WriteOptions, compose};
use crate::Result;

use super::{CompressionDirectory, Package};

/// Accumulates entries from several packages.
///
/// # Example
///
/// ```rust,no_run
/// use sc4pack::{Package, Merger, WriteOptions};
///
/// let base = Package::open_path("base.dat")?;
/// let fixes = Package::open_path("fixes.dat")?;
/// let merged = Merger::new().add(&base).add(&fixes).finish();
/// for warning in &merged.warnings {
///     eprintln!("{}", warning);
/// }
/// std::fs::write("merged.dat", merged.to_bytes(&WriteOptions::default())?)?;
/// # Ok::<(), sc4pack::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Merger {
    entries: Vec<(ResourceKey, Vec<u8>)>,
    positions: HashMap<ResourceKey, usize>,
    warnings: Vec<Warning>,
}

impl Merger {
    /// Creates an empty merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every readable entry of `package`, in index order.
    ///
    /// Unreadable entries are skipped with a [`Warning::SkippedEntry`].
    pub fn add(mut self, package: &Package) -> Self {
        for entry in package.entries() {
            if entry.key.type_id == type_id::DIRECTORY {
                continue;
            }
            match package.read_entry(entry) {
                Ok(data) => self.insert(entry.key, data.to_vec()),
                Err(e) => {
                    log::warn!("skipping {}: {}", entry.key, e);
                    self.warnings.push(Warning::SkippedEntry {
                        key: entry.key,
                        reason: e.to_string(),
                    });
                }
            }
        }
        self
    }

    /// Adds a single entry, overriding any earlier entry with the same key.
    pub fn add_entry(mut self, key: ResourceKey, data: impl Into<Vec<u8>>) -> Self {
        self.insert(key, data.into());
        self
    }

    fn insert(&mut self, key: ResourceKey, data: Vec<u8>) {
        match self.positions.get(&key) {
            Some(&i) => {
                log::warn!("duplicate key {} (later occurrence wins)", key);
                self.warnings.push(Warning::DuplicateKey { key });
                self.entries[i].1 = data;
            }
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push((key, data));
            }
        }
    }

    /// Finishes the merge.
    pub fn finish(self) -> MergeResult {
        MergeResult {
            entries: self.entries,
            warnings: self.warnings,
        }
    }
}

/// The outcome of a merge.
#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    /// Merged entries in first-seen order.
    pub entries: Vec<(ResourceKey, Vec<u8>)>,
    /// Overrides and skipped entries.
    pub warnings: Vec<Warning>,
}

impl MergeResult {
    /// Builds a compression directory for the compressed merged entries.
    ///
    /// Entries whose stream header cannot be read are left out.
    pub fn directory(&self) -> CompressionDirectory {
        let mut directory = CompressionDirectory::default();
        for (key, data) in &self.entries {
            if let Some(size) = codec::unwrap_entry(data).and_then(|s| codec::declared_size(s).ok()) {
                directory.insert(*key, size as u32);
            }
        }
        directory
    }

    /// Writes the merged entries as a new package.
    ///
    /// A compression directory is appended when any entry is compressed.
    pub fn to_bytes(&self, options: &WriteOptions) -> Result<Vec<u8>> {
        let directory = self.directory();
        let directory_bytes = directory.to_bytes();
        let trailer = (!directory.is_empty()).then_some((DIRECTORY_KEY, directory_bytes.as_slice()));
        let entries = self
            .entries
            .iter()
            .map(|(key, data)| (*key, data.as_slice()))
            .chain(trailer);
        compose(entries, options)
    }
}
