//! Package reading API.
//!
//! [`Package`] parses the header and index table of a DBPF package held in
//! memory and hands out entry bytes by key. Only the header and index are
//! validated up front; entry data is checked when it is read, so one damaged
//! entry never prevents reading its siblings.
//!
//! # Example
//!
//! ```rust,no_run
//! use sc4pack::Package;
//!
//! let package = Package::open_path("plugins/lots.dat")?;
//! for entry in package.entries() {
//!     println!("{}: {} bytes", entry.key, entry.size);
//! }
//! # Ok::<(), sc4pack::Error>(())
//! ```

mod directory;
pub mod merge;

pub use directory::{CompressionDirectory, DIRECTORY_RECORD_SIZE};
pub use merge::{MergeResult, Merger};

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::ops::Range;
use std::path::Path;

use crate::codec;
use crate::error::Warning;
use crate::format::header::ContainerHeader;
use crate::format::index::IndexEntry;
use crate::format::reader::ByteReader;
use crate::format::{DIRECTORY_KEY, offsets, type_id};
use crate::key::ResourceKey;
use crate::{Error, Result};

/// A parsed DBPF package.
#[derive(Debug, Clone)]
pub struct Package {
    data: Vec<u8>,
    header: ContainerHeader,
    entries: Vec<IndexEntry>,
    /// Key to position in `entries`; the last occurrence of a key wins.
    lookup: HashMap<ResourceKey, usize>,
    directory: CompressionDirectory,
    warnings: Vec<Warning>,
}

impl Package {
    /// Opens and parses a package file.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(data)
    }

    /// Reads a whole package from `reader` and parses it.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse(data)
    }

    /// Parses a package from its bytes.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidFormat`] if the signature is wrong or the data is
    ///   shorter than the header.
    /// - [`Error::CorruptHeader`] if the index table lies outside the data,
    ///   is too small for the declared entry count, or overlaps entry data.
    pub fn parse(data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        let header = ContainerHeader::parse(&data)?;
        header.validate_index(data.len() as u64)?;

        let mut r = ByteReader::at(&data, header.index_offset as usize);
        let mut entries = Vec::with_capacity(header.index_count as usize);
        for _ in 0..header.index_count {
            entries.push(IndexEntry::read(&mut r)?);
        }

        let index_range = header.index_range();
        if let Some(entry) = entries.iter().find(|e| e.overlaps(&index_range)) {
            return Err(Error::CorruptHeader {
                offset: offsets::INDEX_OFFSET as u64,
                reason: format!(
                    "index range {:#x}..{:#x} overlaps entry {} at {:#x}..{:#x}",
                    index_range.start,
                    index_range.end,
                    entry.key,
                    entry.range().start,
                    entry.range().end
                ),
            });
        }

        let mut warnings = Vec::new();
        let mut lookup = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if lookup.insert(entry.key, i).is_some() {
                log::warn!("duplicate key {} in package index", entry.key);
                warnings.push(Warning::DuplicateKey { key: entry.key });
            }
        }

        let mut package = Self {
            data,
            header,
            entries,
            lookup,
            directory: CompressionDirectory::default(),
            warnings,
        };
        package.load_directory();

        log::debug!(
            "parsed package: {} entries, index at {:#x}",
            package.entries.len(),
            package.header.index_offset
        );
        Ok(package)
    }

    fn load_directory(&mut self) {
        // the well-known key first, then the first directory-typed entry in file order
        let Some(i) = self.lookup.get(&DIRECTORY_KEY).copied().or_else(|| {
            self.entries
                .iter()
                .position(|e| e.key.type_id == type_id::DIRECTORY)
        }) else {
            return;
        };
        let entry = self.entries[i];

        let parsed = self
            .read_entry(&entry)
            .and_then(CompressionDirectory::parse);
        match parsed {
            Ok(directory) => self.directory = directory,
            Err(e) => {
                let e = e.with_key(entry.key);
                log::warn!("ignoring unreadable compression directory: {}", e);
                self.warnings.push(Warning::SkippedEntry {
                    key: entry.key,
                    reason: e.to_string(),
                });
            }
        }
    }

    /// Returns the package header.
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Returns all index entries in file order, duplicates included.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Returns the number of index entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns warnings recorded while parsing.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Returns the raw package bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the compression directory (empty if the package has none).
    pub fn directory(&self) -> &CompressionDirectory {
        &self.directory
    }

    /// Looks up an entry by key.
    pub fn entry(&self, key: ResourceKey) -> Option<&IndexEntry> {
        self.lookup.get(&key).map(|&i| &self.entries[i])
    }

    /// Returns `true` if an entry with `key` exists.
    pub fn contains(&self, key: ResourceKey) -> bool {
        self.lookup.contains_key(&key)
    }

    /// Returns the declared byte range of an entry.
    ///
    /// The range is not checked against the package size.
    pub fn locate(&self, key: ResourceKey) -> Option<Range<usize>> {
        self.entry(key).map(|e| {
            let start = e.offset as usize;
            start..start + e.size as usize
        })
    }

    /// Returns the stored bytes of an entry.
    ///
    /// # Errors
    ///
    /// [`Error::EntryNotFound`] if no entry has `key`, or
    /// [`Error::TruncatedData`] if the entry extends past the end of the
    /// package.
    pub fn read(&self, key: ResourceKey) -> Result<&[u8]> {
        let entry = self.entry(key).ok_or(Error::EntryNotFound { key })?;
        self.read_entry(entry)
    }

    /// Returns the stored bytes of a specific index entry.
    pub fn read_entry(&self, entry: &IndexEntry) -> Result<&[u8]> {
        ByteReader::at(&self.data, entry.offset as usize)
            .read_bytes(entry.size as usize)
            .map_err(|e| e.with_key(entry.key))
    }

    /// Returns the bytes of an entry, decompressing them if needed.
    ///
    /// When the package's compression directory lists the entry, its size is
    /// checked against the size declared by the stream.
    pub fn read_decompressed(&self, key: ResourceKey) -> Result<Cow<'_, [u8]>> {
        let raw = self.read(key)?;
        match codec::unwrap_entry(raw) {
            Some(stream) => {
                let expected = self.directory.get(key).map(|size| size as usize);
                codec::decode(stream, expected)
                    .map(Cow::Owned)
                    .map_err(|e| e.with_key(key))
            }
            None => Ok(Cow::Borrowed(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{HEADER_SIZE, INDEX_ENTRY_SIZE};

    /// Builds a package by hand: entry payloads after the header, then the index.
    fn package_bytes(entries: &[(ResourceKey, &[u8])]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_SIZE];
        let mut index = Vec::new();
        for (key, payload) in entries {
            let entry = IndexEntry {
                key: *key,
                offset: data.len() as u32,
                size: payload.len() as u32,
            };
            data.extend_from_slice(payload);
            index.extend_from_slice(&entry.to_bytes());
        }
        let header = ContainerHeader {
            index_count: entries.len() as u32,
            index_offset: data.len() as u32,
            index_size: index.len() as u32,
            ..ContainerHeader::default()
        };
        data[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        data.extend_from_slice(&index);
        data
    }

    fn key(i: u32) -> ResourceKey {
        ResourceKey::new(type_id::EXEMPLAR, 0xA8FB_D372, i)
    }

    #[test]
    fn test_parse_and_read() {
        let bytes = package_bytes(&[(key(1), b"one"), (key(2), b"second")]);
        let package = Package::parse(bytes).unwrap();
        assert_eq!(package.len(), 2);
        assert_eq!(package.header().index_count, 2);
        assert_eq!(package.read(key(2)).unwrap(), b"second");
        assert_eq!(package.locate(key(1)), Some(96..99));
        assert!(package.warnings().is_empty());
    }

    #[test]
    fn test_missing_key() {
        let package = Package::parse(package_bytes(&[(key(1), b"x")])).unwrap();
        assert!(matches!(
            package.read(key(9)),
            Err(Error::EntryNotFound { .. })
        ));
        assert_eq!(package.locate(key(9)), None);
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let bytes = package_bytes(&[(key(1), b"old"), (key(1), b"new")]);
        let package = Package::parse(bytes).unwrap();
        assert_eq!(package.len(), 2);
        assert_eq!(package.read(key(1)).unwrap(), b"new");
        assert_eq!(
            package.warnings(),
            &[Warning::DuplicateKey { key: key(1) }]
        );
    }

    #[test]
    fn test_entry_past_end_is_entry_local() {
        let mut bytes = package_bytes(&[(key(1), b"abc"), (key(2), b"def")]);
        // move the second entry past the end of the file
        let offset_at = bytes.len() - INDEX_ENTRY_SIZE + 12;
        let past_end = bytes.len() as u32 + 10;
        bytes[offset_at..offset_at + 4].copy_from_slice(&past_end.to_le_bytes());
        let package = Package::parse(bytes).unwrap();
        assert_eq!(package.read(key(1)).unwrap(), b"abc");
        let err = package.read(key(2)).unwrap_err();
        assert!(matches!(err, Error::TruncatedData { .. }));
        assert_eq!(err.key(), Some(key(2)));
    }

    #[test]
    fn test_index_overlapping_entry() {
        let mut bytes = package_bytes(&[(key(1), b"abcd")]);
        // point the entry at the index itself
        let offset_at = bytes.len() - INDEX_ENTRY_SIZE + 12;
        let index_offset = (bytes.len() - INDEX_ENTRY_SIZE) as u32;
        bytes[offset_at..offset_at + 4].copy_from_slice(&index_offset.to_le_bytes());
        assert!(matches!(
            Package::parse(bytes),
            Err(Error::CorruptHeader { .. })
        ));
    }

    #[test]
    fn test_read_decompressed() {
        let stream = [0x10, 0xFB, 0x00, 0x00, 0x0B, 0x1D, 0x00, 0x41, 0xFC];
        let mut wrapped = ((stream.len() + 4) as u32).to_le_bytes().to_vec();
        wrapped.extend_from_slice(&stream);

        let mut dir = CompressionDirectory::default();
        dir.insert(key(1), 11);
        let dir_key = ResourceKey::new(type_id::DIRECTORY, type_id::DIRECTORY, 0x286B_1F03);
        let dir_bytes = dir.to_bytes();

        let bytes = package_bytes(&[(key(1), &wrapped), (key(2), b"plain"), (dir_key, &dir_bytes)]);
        let package = Package::parse(bytes).unwrap();
        assert_eq!(package.directory().get(key(1)), Some(11));
        assert_eq!(&*package.read_decompressed(key(1)).unwrap(), &[0x41; 11]);
        let plain = package.read_decompressed(key(2)).unwrap();
        assert!(matches!(plain, Cow::Borrowed(_)));
        assert_eq!(&*plain, b"plain");
    }

    #[test]
    fn test_well_known_directory_key_preferred() {
        let mut real = CompressionDirectory::default();
        real.insert(key(1), 11);
        let mut other = CompressionDirectory::default();
        other.insert(key(1), 99);
        other.insert(key(2), 5);
        let (real_bytes, other_bytes) = (real.to_bytes(), other.to_bytes());
        let other_key = ResourceKey::new(type_id::DIRECTORY, type_id::DIRECTORY, 1);

        // lookup hash order differs on every parse
        for _ in 0..32 {
            let bytes = package_bytes(&[(other_key, &other_bytes), (DIRECTORY_KEY, &real_bytes)]);
            let package = Package::parse(bytes).unwrap();
            assert_eq!(package.directory().len(), 1);
            assert_eq!(package.directory().get(key(1)), Some(11));
        }
    }

    #[test]
    fn test_directory_fallback_is_first_in_file_order() {
        let mut first = CompressionDirectory::default();
        first.insert(key(1), 11);
        let mut second = CompressionDirectory::default();
        second.insert(key(1), 99);
        let (first_bytes, second_bytes) = (first.to_bytes(), second.to_bytes());
        let bytes = package_bytes(&[
            (ResourceKey::new(type_id::DIRECTORY, 0, 7), &first_bytes),
            (ResourceKey::new(type_id::DIRECTORY, 0, 3), &second_bytes),
        ]);
        let package = Package::parse(bytes).unwrap();
        assert_eq!(package.directory().get(key(1)), Some(11));
    }

    #[test]
    fn test_directory_size_mismatch_carries_key() {
        let stream = [0x10, 0xFB, 0x00, 0x00, 0x0B, 0x1D, 0x00, 0x41, 0xFC];
        let mut wrapped = 13u32.to_le_bytes().to_vec();
        wrapped.extend_from_slice(&stream);

        let mut dir = CompressionDirectory::default();
        dir.insert(key(1), 12);
        let dir_key = ResourceKey::new(type_id::DIRECTORY, type_id::DIRECTORY, 0x286B_1F03);
        let dir_bytes = dir.to_bytes();

        let bytes = package_bytes(&[(key(1), &wrapped), (dir_key, &dir_bytes)]);
        let package = Package::parse(bytes).unwrap();
        let err = package.read_decompressed(key(1)).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { .. }));
        assert_eq!(err.key(), Some(key(1)));
    }
}
