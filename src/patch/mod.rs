//! Exemplar patch generation.
//!
//! An exemplar patch is a Cohort resource in group
//! [`EXEMPLAR_PATCH`](crate::format::group_id::EXEMPLAR_PATCH) whose property
//! block lists target exemplars and one override value. A loader applies the
//! override to every target when the game starts. With the default
//! [`DEFAULT_OVERRIDE`] (a minimum slope no terrain satisfies) the targeted
//! lots never grow.
//!
//! # Example
//!
//! ```
//! use sc4pack::patch::{self, InstanceAllocator, PatchTarget};
//! use sc4pack::{Package, WriteOptions};
//!
//! let targets = vec![PatchTarget::new(0xA8FB_D372, 0x6A63_633B)];
//! let mut ids = InstanceAllocator::default();
//! let patches = patch::build_batch(&[targets], patch::DEFAULT_OVERRIDE, &mut ids);
//!
//! let bytes = sc4pack::write::compose(patches, &WriteOptions::default())?;
//! let package = Package::parse(bytes)?;
//! let found = patch::inspect_package(&package)?;
//! assert_eq!(found[0].targets[0].instance_id, 0x6A63_633B);
//! # Ok::<(), sc4pack::Error>(())
//! ```

mod allocator;

pub use allocator::{DEFAULT_BASE, HASHED_BASE, HASHED_SPAN, InstanceAllocator};

use std::io::{Seek, Write};

use crate::exemplar::{self, DecodeOptions, PropertyBlock, PropertyId, ResourceKind, SubHeader};
use crate::format::{group_id, type_id};
use crate::key::ResourceKey;
use crate::read::Package;
use crate::write::{WriteOptions, WriteResult, Writer};
use crate::{Error, Result};

/// Override value written when none is given: a minimum slope that blocks
/// growth.
pub const DEFAULT_OVERRIDE: f32 = 89.0;

/// One exemplar a patch applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatchTarget {
    /// Group id of the target exemplar.
    pub group_id: u32,
    /// Instance id of the target exemplar.
    pub instance_id: u32,
}

impl PatchTarget {
    /// Creates a target.
    pub const fn new(group_id: u32, instance_id: u32) -> Self {
        Self {
            group_id,
            instance_id,
        }
    }
}

impl From<ResourceKey> for PatchTarget {
    fn from(key: ResourceKey) -> Self {
        Self::new(key.group_id, key.instance_id)
    }
}

impl From<(u32, u32)> for PatchTarget {
    fn from((group_id, instance_id): (u32, u32)) -> Self {
        Self::new(group_id, instance_id)
    }
}

/// An exemplar patch before encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortPatch {
    /// Instance id of the generated cohort.
    pub instance_id: u32,
    /// Exemplars to patch, in order.
    pub targets: Vec<PatchTarget>,
    /// Value applied to every target.
    pub override_value: f32,
}

impl CohortPatch {
    /// Creates a patch with the default override value.
    pub fn new(instance_id: u32, targets: impl IntoIterator<Item = PatchTarget>) -> Self {
        Self {
            instance_id,
            targets: targets.into_iter().collect(),
            override_value: DEFAULT_OVERRIDE,
        }
    }

    /// Sets the override value.
    pub fn override_value(mut self, value: f32) -> Self {
        self.override_value = value;
        self
    }

    /// Key the patch is stored under.
    pub fn key(&self) -> ResourceKey {
        patch_key(self.instance_id)
    }

    /// Encodes the patch resource.
    pub fn build(&self) -> (ResourceKey, Vec<u8>) {
        build(&self.targets, self.instance_id, self.override_value)
    }
}

fn patch_key(instance_id: u32) -> ResourceKey {
    ResourceKey::new(type_id::COHORT, group_id::EXEMPLAR_PATCH, instance_id)
}

/// Encodes an exemplar patch: cohort sub-header, then the two-record block.
pub fn build(targets: &[PatchTarget], instance_id: u32, override_value: f32) -> (ResourceKey, Vec<u8>) {
    let pairs: Vec<(u32, u32)> = targets
        .iter()
        .map(|t| (t.group_id, t.instance_id))
        .collect();
    let mut bytes = SubHeader::cohort().to_bytes().to_vec();
    bytes.extend_from_slice(&exemplar::encode(&pairs, override_value));
    (patch_key(instance_id), bytes)
}

/// Builds one patch per target list, drawing instance ids from `allocator`.
pub fn build_batch<T>(
    target_lists: &[T],
    override_value: f32,
    allocator: &mut InstanceAllocator,
) -> Vec<(ResourceKey, Vec<u8>)>
where
    T: AsRef<[PatchTarget]>,
{
    target_lists
        .iter()
        .map(|targets| {
            let instance_id = allocator.next_id();
            log::debug!(
                "patch {:#010X}: {} targets",
                instance_id,
                targets.as_ref().len()
            );
            build(targets.as_ref(), instance_id, override_value)
        })
        .collect()
}

/// Writes built patches as a new package.
pub fn write_batch<W: Write + Seek>(
    sink: W,
    patches: &[(ResourceKey, Vec<u8>)],
    options: &WriteOptions,
) -> Result<WriteResult> {
    let mut writer = Writer::with_options(sink, options)?;
    for (key, bytes) in patches {
        writer.add_entry(*key, bytes)?;
    }
    writer.finish()
}

fn mismatch(key: ResourceKey, reason: impl Into<String>) -> Error {
    Error::ShapeMismatch {
        key: Some(key),
        reason: reason.into(),
    }
}

/// Checks that a resource is a well-formed exemplar patch and returns it.
///
/// # Errors
///
/// [`Error::ShapeMismatch`] unless the key is in the exemplar patch
/// type/group, the payload is a cohort, and its block holds exactly a
/// target list with an even number of ids followed by one float.
pub fn inspect(key: ResourceKey, bytes: &[u8]) -> Result<CohortPatch> {
    if key.type_id != type_id::COHORT || key.group_id != group_id::EXEMPLAR_PATCH {
        return Err(mismatch(key, "key is not in the exemplar patch type and group"));
    }

    let (header, block) =
        exemplar::decode_resource(bytes, &DecodeOptions::default()).map_err(|e| e.with_key(key))?;
    if header.kind != ResourceKind::Cohort {
        return Err(mismatch(key, "payload is an exemplar, not a cohort"));
    }
    check_block(key, &block)
}

fn check_block(key: ResourceKey, block: &PropertyBlock) -> Result<CohortPatch> {
    if block.declared_count != 2 {
        return Err(mismatch(
            key,
            format!("expected 2 property records, found {}", block.declared_count),
        ));
    }
    if block.partial {
        return Err(mismatch(key, "property block is incomplete"));
    }

    let first = &block.records[0];
    let ids = match (first.id, first.value.as_u32s()) {
        (PropertyId::ExemplarPatchTargets, Some(ids)) if ids.len() % 2 == 0 => ids,
        (PropertyId::ExemplarPatchTargets, Some(ids)) => {
            return Err(mismatch(key, format!("odd number of target ids: {}", ids.len())));
        }
        (id, _) => {
            return Err(mismatch(
                key,
                format!("first record is {} with type {:#06x}, expected a u32 target list", id, first.type_tag),
            ));
        }
    };

    let second = &block.records[1];
    let value = match (second.id, second.value.as_f32s()) {
        (PropertyId::MinSlope, Some(&[value])) => value,
        (id, _) => {
            return Err(mismatch(
                key,
                format!("second record is {} with type {:#06x}, expected a single float", id, second.type_tag),
            ));
        }
    };

    Ok(CohortPatch {
        instance_id: key.instance_id,
        targets: ids
            .chunks_exact(2)
            .map(|pair| PatchTarget::new(pair[0], pair[1]))
            .collect(),
        override_value: value,
    })
}

/// Inspects every exemplar patch in a package.
///
/// Entries outside the exemplar patch type/group are ignored.
pub fn inspect_package(package: &Package) -> Result<Vec<CohortPatch>> {
    let mut patches = Vec::new();
    for entry in package.entries() {
        let key = entry.key;
        if key.type_id != type_id::COHORT || key.group_id != group_id::EXEMPLAR_PATCH {
            continue;
        }
        let bytes = package.read_decompressed(key)?;
        patches.push(inspect(key, &bytes)?);
    }
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<PatchTarget> {
        vec![
            PatchTarget::new(group_id::LOT_CONFIGURATION, 0x6A63_633B),
            PatchTarget::new(group_id::LOT_CONFIGURATION, 0x6A63_6340),
        ]
    }

    #[test]
    fn test_build_key_and_header() {
        let (key, bytes) = build(&targets(), 0xFE7C_D975, 89.0);
        assert_eq!(key, ResourceKey::new(0x0534_2861, 0xB036_97D1, 0xFE7C_D975));
        assert_eq!(&bytes[..8], b"CQZB1###");
        assert!(bytes[8..20].iter().all(|&b| b == 0));
        assert_eq!(&bytes[20..24], &2u32.to_le_bytes());
    }

    #[test]
    fn test_inspect_roundtrip() {
        let patch = CohortPatch::new(0x1234, targets()).override_value(45.5);
        let (key, bytes) = patch.build();
        assert_eq!(inspect(key, &bytes).unwrap(), patch);
    }

    #[test]
    fn test_inspect_wrong_count() {
        let (key, mut bytes) = build(&targets(), 1, 89.0);
        for count in [0u32, 1, 3] {
            bytes[20..24].copy_from_slice(&count.to_le_bytes());
            let err = inspect(key, &bytes).unwrap_err();
            assert!(matches!(err, Error::ShapeMismatch { .. }), "count {}", count);
            assert_eq!(err.key(), Some(key));
        }
    }

    #[test]
    fn test_inspect_wrong_key() {
        let (_, bytes) = build(&targets(), 1, 89.0);
        let key = ResourceKey::new(type_id::EXEMPLAR, group_id::EXEMPLAR_PATCH, 1);
        assert!(matches!(
            inspect(key, &bytes),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_inspect_odd_target_list() {
        let (key, mut bytes) = build(&targets(), 1, 89.0);
        // 2n = 4 becomes 3: the record now ends early and the float record
        // starts inside the target list
        bytes[33] = 3;
        assert!(inspect(key, &bytes).is_err());
    }

    #[test]
    fn test_inspect_large_batch() {
        let many: Vec<_> = (0..300)
            .map(|i| PatchTarget::new(group_id::LOT_CONFIGURATION, i))
            .collect();
        let (key, bytes) = build(&many, 7, 89.0);
        let patch = inspect(key, &bytes).unwrap();
        assert_eq!(patch.targets, many);
    }

    #[test]
    fn test_build_batch_sequential() {
        let lists = vec![targets(), targets()[..1].to_vec()];
        let mut ids = InstanceAllocator::sequential(0x100);
        let built = build_batch(&lists, 89.0, &mut ids);
        assert_eq!(built[0].0.instance_id, 0x100);
        assert_eq!(built[1].0.instance_id, 0x101);
        assert_eq!(ids.peek(), 0x102);
    }

    #[test]
    fn test_write_batch() {
        let mut ids = InstanceAllocator::default();
        let built = build_batch(&[targets()], 89.0, &mut ids);
        let mut cursor = std::io::Cursor::new(Vec::new());
        let result = write_batch(&mut cursor, &built, &WriteOptions::default()).unwrap();
        assert_eq!(result.entries_written, 1);

        let package = Package::parse(cursor.into_inner()).unwrap();
        let patches = inspect_package(&package).unwrap();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].instance_id, DEFAULT_BASE);
        assert_eq!(patches[0].override_value, 89.0);
    }
}
