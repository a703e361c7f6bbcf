//! Exemplar and Cohort property blocks.
//!
//! Exemplar and Cohort resources share one payload format: a 20-byte
//! [`SubHeader`] followed by a property block, which is a u32 record count
//! and that many typed property records.
//!
//! # Record layout
//!
//! | bytes | field |
//! |-------|-------|
//! | 0..4  | property id, u32 LE |
//! | 4..6  | type tag, u16 LE |
//! | 6..8  | flag word, u16 LE (`0x0080` marks an array) |
//! | 8..10 | repetition count, u16 **BE** |
//! | 10..13 | padding, must be zero |
//! | 13..  | payload: `repetition` values of the tagged type |
//!
//! Ids listed in [`strategy::STRATEGY_TABLE`] deviate from this layout.
//!
//! # Example
//!
//! ```
//! use sc4pack::exemplar::{self, PropertyId};
//!
//! let bytes = exemplar::encode(&[(0xA8FB_D372, 0x1234_5678)], 89.0);
//! let block = exemplar::decode(&bytes)?;
//! assert!(!block.partial);
//! let targets = block.get(PropertyId::ExemplarPatchTargets).unwrap();
//! assert_eq!(targets.value.as_u32s(), Some(&[0xA8FB_D372, 0x1234_5678][..]));
//! # Ok::<(), sc4pack::Error>(())
//! ```

mod decode;
mod encode;
pub mod strategy;

pub use decode::{DecodeOptions, LayoutPolicy, decode, decode_resource, decode_with};
pub use encode::encode;
pub use strategy::{DecodeStrategy, strategy_for};

use std::fmt;

use crate::error::Warning;
use crate::format::reader::ByteReader;
use crate::key::ResourceKey;
use crate::{Error, Result};

/// Property type tags.
pub mod type_tag {
    /// Sequence of u8.
    pub const U8: u16 = 0x0100;
    /// Sequence of u16 LE.
    pub const U16: u16 = 0x0200;
    /// Sequence of u32 LE.
    pub const U32: u16 = 0x0300;
    /// Sequence of f32 LE.
    pub const F32: u16 = 0x0900;
    /// Text.
    pub const TEXT: u16 = 0x0C00;
    /// Text (alternate tag).
    pub const TEXT_ALT: u16 = 0x0C05;
}

/// Flag word bit marking a record as an array.
pub const FLAG_ARRAY: u16 = 0x0080;

macro_rules! property_ids {
    ($($(#[$doc:meta])* $name:ident = $id:literal,)*) => {
        /// Property ids this crate knows by name.
        ///
        /// Ids outside the list decode as [`PropertyId::Unknown`]. Always build
        /// values through [`PropertyId::from_raw`] so a known id never ends up
        /// wrapped in `Unknown`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum PropertyId {
            $($(#[$doc])* $name,)*
            /// Any other id.
            Unknown(u32),
        }

        impl PropertyId {
            /// Maps a raw id to its enumeration value.
            pub const fn from_raw(raw: u32) -> Self {
                match raw {
                    $($id => PropertyId::$name,)*
                    other => PropertyId::Unknown(other),
                }
            }

            /// Returns the raw id.
            pub const fn raw(self) -> u32 {
                match self {
                    $(PropertyId::$name => $id,)*
                    PropertyId::Unknown(raw) => raw,
                }
            }

            /// Returns the property name, or `None` for unknown ids.
            pub const fn name(self) -> Option<&'static str> {
                match self {
                    $(PropertyId::$name => Some(stringify!($name)),)*
                    PropertyId::Unknown(_) => None,
                }
            }

            /// Looks up a known id by name.
            pub fn from_name(name: &str) -> Option<Self> {
                $(
                    if name == stringify!($name) {
                        return Some(PropertyId::$name);
                    }
                )*
                None
            }
        }
    };
}

property_ids! {
    /// Exemplar name (text).
    ExemplarName = 0x0000_0020,
    /// Keys patched by an exemplar patch, as (group, instance) pairs.
    ExemplarPatchTargets = 0x0062_E78A,
    /// Minimum slope a lot tolerates.
    MinSlope = 0x699B_08A4,
    /// Lot configuration object.
    LotConfigPropertyLotObject = 0x88ED_C792,
    /// Zone types a lot may appear in.
    ZoneTypes = 0x88ED_C793,
    /// Wealth levels a lot serves.
    ZoneWealth = 0x88ED_C795,
    /// Purpose of the zone (residential, commercial, ...).
    ZonePurpose = 0x88ED_C796,
    /// Growth stage of a lot.
    GrowthStage = 0x2781_2837,
    /// Road corner indicator.
    RoadCornerIndicator = 0x4A4A_88F0,
}

impl From<u32> for PropertyId {
    fn from(raw: u32) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#010X}", self.raw()),
        }
    }
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `0x0100` values.
    U8(Vec<u8>),
    /// `0x0200` values.
    U16(Vec<u16>),
    /// `0x0300` values.
    U32(Vec<u32>),
    /// `0x0900` values.
    F32(Vec<f32>),
    /// Text, cut at the first NUL. Invalid UTF-8 is replaced.
    Text(String),
    /// Bytes of a record whose type tag is not understood.
    Opaque(Vec<u8>),
}

impl PropertyValue {
    /// Returns the u32 values, if this is a u32 sequence.
    pub fn as_u32s(&self) -> Option<&[u32]> {
        match self {
            PropertyValue::U32(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the f32 values, if this is a float sequence.
    pub fn as_f32s(&self) -> Option<&[f32]> {
        match self {
            PropertyValue::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Widens integer values to u64. `None` for floats, text and opaque bytes.
    pub fn to_integers(&self) -> Option<Vec<u64>> {
        match self {
            PropertyValue::U8(v) => Some(v.iter().map(|&x| x as u64).collect()),
            PropertyValue::U16(v) => Some(v.iter().map(|&x| x as u64).collect()),
            PropertyValue::U32(v) => Some(v.iter().map(|&x| x as u64).collect()),
            _ => None,
        }
    }

    /// Number of values (characters for text, bytes for opaque data).
    pub fn len(&self) -> usize {
        match self {
            PropertyValue::U8(v) | PropertyValue::Opaque(v) => v.len(),
            PropertyValue::U16(v) => v.len(),
            PropertyValue::U32(v) => v.len(),
            PropertyValue::F32(v) => v.len(),
            PropertyValue::Text(s) => s.chars().count(),
        }
    }

    /// Returns `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One decoded property record.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    /// Property id.
    pub id: PropertyId,
    /// Raw type tag.
    pub type_tag: u16,
    /// Raw flag word.
    pub flags: u16,
    /// Repetition count as stored (the value itself for value-in-count ids).
    pub repetition: u32,
    /// Decoded value.
    pub value: PropertyValue,
    /// Offset of the record within the property block.
    pub offset: usize,
}

impl PropertyRecord {
    /// Returns `true` if the flag word marks the record as an array.
    pub fn is_array(&self) -> bool {
        self.flags & FLAG_ARRAY != 0
    }
}

/// The decoded records of a property block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBlock {
    /// Record count declared by the block.
    pub declared_count: u32,
    /// Records decoded, in order.
    pub records: Vec<PropertyRecord>,
    /// `true` if decoding stopped before `declared_count` records.
    pub partial: bool,
    /// Anomalies seen while decoding.
    pub warnings: Vec<Warning>,
}

impl PropertyBlock {
    /// Returns the first record with `id`.
    pub fn get(&self, id: PropertyId) -> Option<&PropertyRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Iterates over the records in order.
    pub fn iter(&self) -> std::slice::Iter<'_, PropertyRecord> {
        self.records.iter()
    }

    /// Number of decoded records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no records were decoded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a PropertyBlock {
    type Item = &'a PropertyRecord;
    type IntoIter = std::slice::Iter<'a, PropertyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Kind of resource a sub-header introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `EQZB`.
    Exemplar,
    /// `CQZB`.
    Cohort,
}

/// The 20-byte header preceding a binary property block.
///
/// After the 4-byte signature and the `1###` marker come 12 bytes naming the
/// parent cohort. Generated patches leave them zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubHeader {
    /// Exemplar or cohort.
    pub kind: ResourceKind,
    /// Parent cohort key (all zero when there is none).
    pub parent: ResourceKey,
}

impl SubHeader {
    /// Encoded size.
    pub const SIZE: usize = 20;

    const EXEMPLAR: &'static [u8; 4] = b"EQZB";
    const COHORT: &'static [u8; 4] = b"CQZB";
    const MARKER: &'static [u8; 4] = b"1###";

    /// An exemplar header without parent.
    pub const fn exemplar() -> Self {
        Self {
            kind: ResourceKind::Exemplar,
            parent: ResourceKey::new(0, 0, 0),
        }
    }

    /// A cohort header without parent.
    pub const fn cohort() -> Self {
        Self {
            kind: ResourceKind::Cohort,
            parent: ResourceKey::new(0, 0, 0),
        }
    }

    /// Parses the header at the start of `bytes`.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedFeature`] for text exemplars (`EQZT`/`CQZT`),
    /// [`Error::InvalidFormat`] for any other unrecognised signature or
    /// marker, and [`Error::TruncatedData`] if fewer than 20 bytes are given.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes);
        let signature: [u8; 4] = r.read_array()?;
        let kind = match &signature {
            s if s == Self::EXEMPLAR => ResourceKind::Exemplar,
            s if s == Self::COHORT => ResourceKind::Cohort,
            b"EQZT" | b"CQZT" => {
                return Err(Error::UnsupportedFeature {
                    feature: "text exemplars",
                });
            }
            _ => {
                return Err(Error::InvalidFormat(format!(
                    "unrecognised exemplar signature {:02X?}",
                    signature
                )));
            }
        };
        let marker: [u8; 4] = r.read_array()?;
        if &marker != Self::MARKER {
            return Err(Error::InvalidFormat(format!(
                "unrecognised exemplar marker {:02X?}",
                marker
            )));
        }
        let parent = ResourceKey::from_le_bytes(r.read_array()?);
        Ok(Self { kind, parent })
    }

    /// Encodes the header.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(match self.kind {
            ResourceKind::Exemplar => Self::EXEMPLAR,
            ResourceKind::Cohort => Self::COHORT,
        });
        out[4..8].copy_from_slice(Self::MARKER);
        out[8..20].copy_from_slice(&self.parent.to_le_bytes());
        out
    }
}
