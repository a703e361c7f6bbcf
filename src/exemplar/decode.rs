//! Property block decoder.

use std::fmt;

use crate::error::Warning;
use crate::format::reader::ByteReader;
use crate::{Error, Result};

use super::strategy::{DecodeStrategy, strategy_for};
use super::{
    FLAG_ARRAY, PropertyBlock, PropertyId, PropertyRecord, PropertyValue, SubHeader, type_tag,
};

/// Size of the id, type tag, flag word and repetition count.
const RECORD_HEADER_SIZE: usize = 10;

/// What to do with a record whose padding bytes are not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutPolicy {
    /// Stop decoding the block and report [`Warning::LayoutMismatch`].
    #[default]
    Canonical,
    /// Re-read the record in the wide layout (a zero byte, then a u32 LE
    /// count for arrays or the value directly for scalars) and report
    /// [`Warning::WideCountLayout`].
    Sniff,
}

/// Options for decoding property blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Handling of records that break the canonical layout.
    pub layout: LayoutPolicy,
}

impl DecodeOptions {
    /// Creates options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the layout policy.
    pub fn layout(mut self, layout: LayoutPolicy) -> Self {
        self.layout = layout;
        self
    }
}

/// Why decoding of a block stopped early.
enum Stop {
    Truncated(Error),
    Layout,
}

impl From<Error> for Stop {
    fn from(e: Error) -> Self {
        Stop::Truncated(e)
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stop::Truncated(e) => write!(f, "{}", e),
            Stop::Layout => f.write_str("record does not match the canonical layout"),
        }
    }
}

/// Decodes a property block with default options.
///
/// `bytes` starts at the record count, after the [`SubHeader`].
///
/// # Errors
///
/// Only [`Error::TruncatedData`] when the 4-byte count is missing. Problems
/// inside records end decoding early: the records read so far are returned
/// with [`PropertyBlock::partial`] set and a [`Warning::ParseStopped`].
pub fn decode(bytes: &[u8]) -> Result<PropertyBlock> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decodes a property block.
pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<PropertyBlock> {
    let mut r = ByteReader::new(bytes);
    let declared = r.read_u32_le()?;
    let capacity = (declared as usize).min(r.remaining() / RECORD_HEADER_SIZE);
    let mut block = PropertyBlock {
        declared_count: declared,
        records: Vec::with_capacity(capacity),
        partial: false,
        warnings: Vec::new(),
    };

    for _ in 0..declared {
        let start = r.position();
        match decode_record(&mut r, options, &mut block.warnings) {
            Ok(record) => block.records.push(record),
            Err(stop) => {
                let warning = Warning::ParseStopped {
                    offset: start,
                    decoded: block.records.len(),
                    declared,
                    reason: stop.to_string(),
                };
                log::warn!("{}", warning);
                block.warnings.push(warning);
                block.partial = true;
                break;
            }
        }
    }

    if !block.partial && !r.is_empty() {
        log::debug!("{} trailing bytes after property block", r.remaining());
    }
    Ok(block)
}

/// Decodes an Exemplar or Cohort resource: sub-header, then property block.
///
/// # Errors
///
/// Fails if the sub-header is missing or not a binary exemplar/cohort
/// header, or if the record count is missing.
pub fn decode_resource(bytes: &[u8], options: &DecodeOptions) -> Result<(SubHeader, PropertyBlock)> {
    let header = SubHeader::parse(bytes)?;
    let block = decode_with(&bytes[SubHeader::SIZE..], options)?;
    Ok((header, block))
}

fn decode_record(
    r: &mut ByteReader<'_>,
    options: &DecodeOptions,
    warnings: &mut Vec<Warning>,
) -> std::result::Result<PropertyRecord, Stop> {
    let offset = r.position();
    let id = PropertyId::from_raw(r.read_u32_le()?);
    let type_tag = r.read_u16_le()?;
    let flags = r.read_u16_le()?;
    let strategy = strategy_for(id);

    if strategy == DecodeStrategy::ValueInCount && type_tag == type_tag::U8 {
        let count = r.read_u16_be()?;
        return Ok(PropertyRecord {
            id,
            type_tag,
            flags,
            repetition: count as u32,
            value: PropertyValue::U8(vec![(count & 0xFF) as u8]),
            offset,
        });
    }

    let patch_layout = strategy == DecodeStrategy::PatchLayout
        && flags & FLAG_ARRAY != 0
        && r.peek_bytes(1)?[0] == 0;
    let checkpoint = r.clone();
    let count = r.read_u16_be()?;
    let padding: [u8; 3] = r.read_array()?;

    let repetition = if patch_layout {
        *r = checkpoint;
        r.skip(1)?;
        r.read_u32_le()?
    } else if padding == [0; 3] || strategy == DecodeStrategy::PaddingExempt {
        count as u32
    } else {
        let mismatch = Warning::LayoutMismatch {
            property_id: id.raw(),
            offset,
        };
        if options.layout == LayoutPolicy::Canonical {
            log::warn!("{}", mismatch);
            warnings.push(mismatch);
            return Err(Stop::Layout);
        }

        *r = checkpoint;
        if r.read_u8()? != 0 {
            log::warn!("{}", mismatch);
            warnings.push(mismatch);
            return Err(Stop::Layout);
        }
        let repetition = if flags & FLAG_ARRAY != 0 {
            r.read_u32_le()?
        } else {
            1
        };
        let wide = Warning::WideCountLayout {
            property_id: id.raw(),
            offset,
        };
        log::warn!("{}", wide);
        warnings.push(wide);
        repetition
    };

    let value = read_value(r, type_tag, repetition as usize)?;
    if let PropertyValue::Opaque(_) = value {
        let warning = Warning::UnknownPropertyType {
            property_id: id.raw(),
            type_tag,
            offset,
        };
        log::warn!("{}", warning);
        warnings.push(warning);
    }

    Ok(PropertyRecord {
        id,
        type_tag,
        flags,
        repetition,
        value,
        offset,
    })
}

fn read_value(r: &mut ByteReader<'_>, tag: u16, count: usize) -> Result<PropertyValue> {
    let value = match tag {
        type_tag::U8 => PropertyValue::U8(r.read_bytes(count)?.to_vec()),
        type_tag::U16 => PropertyValue::U16(
            r.read_bytes(count.saturating_mul(2))?
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        type_tag::U32 => PropertyValue::U32(
            r.read_bytes(count.saturating_mul(4))?
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        type_tag::F32 => PropertyValue::F32(
            r.read_bytes(count.saturating_mul(4))?
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        type_tag::TEXT | type_tag::TEXT_ALT => {
            let bytes = r.read_bytes(count)?;
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            PropertyValue::Text(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
        _ => PropertyValue::Opaque(r.read_bytes(count)?.to_vec()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, tag: u16, flags: u16, count: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(&[0, 0, 0]);
        out.extend_from_slice(payload);
        out
    }

    fn block(records: &[Vec<u8>]) -> Vec<u8> {
        let mut out = (records.len() as u32).to_le_bytes().to_vec();
        for r in records {
            out.extend_from_slice(r);
        }
        out
    }

    #[test]
    fn test_value_in_count() {
        // 0x0006 in the count field decodes to 6; the next record follows at byte 10
        let mut growth = Vec::new();
        growth.extend_from_slice(&0x2781_2837u32.to_le_bytes());
        growth.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x06]);
        let next = record(0x1000, type_tag::U8, FLAG_ARRAY, 2, &[7, 8]);
        let decoded = decode(&block(&[growth, next])).unwrap();

        assert!(!decoded.partial);
        assert_eq!(decoded.records[0].id, PropertyId::GrowthStage);
        assert_eq!(decoded.records[0].value, PropertyValue::U8(vec![6]));
        assert_eq!(decoded.records[1].offset, 14);
        assert_eq!(decoded.records[1].value, PropertyValue::U8(vec![7, 8]));
    }

    #[test]
    fn test_value_in_count_other_type_uses_standard() {
        let payload = 42u32.to_le_bytes();
        let rec = record(0x4A4A_88F0, type_tag::U32, 0, 1, &payload);
        let decoded = decode(&block(&[rec])).unwrap();
        assert_eq!(decoded.records[0].value, PropertyValue::U32(vec![42]));
    }

    #[test]
    fn test_typed_values() {
        let records = [
            record(1, type_tag::U16, FLAG_ARRAY, 2, &[0x01, 0x00, 0xFF, 0xFF]),
            record(2, type_tag::F32, 0, 1, &1.5f32.to_le_bytes()),
            record(3, type_tag::TEXT, FLAG_ARRAY, 6, b"Lot\0xx"),
            record(4, type_tag::TEXT_ALT, FLAG_ARRAY, 2, &[0x41, 0xFF]),
        ];
        let decoded = decode(&block(&records)).unwrap();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded.records[0].value, PropertyValue::U16(vec![1, 0xFFFF]));
        assert!(decoded.records[0].is_array());
        assert_eq!(decoded.records[1].value, PropertyValue::F32(vec![1.5]));
        assert!(!decoded.records[1].is_array());
        assert_eq!(decoded.records[2].value.as_text(), Some("Lot"));
        assert_eq!(decoded.records[3].value.as_text(), Some("A\u{FFFD}"));
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn test_unknown_type_kept_opaque() {
        let records = [
            record(0x10, 0x0700, FLAG_ARRAY, 3, &[1, 2, 3]),
            record(0x11, type_tag::U8, FLAG_ARRAY, 1, &[9]),
        ];
        let decoded = decode(&block(&records)).unwrap();
        assert!(!decoded.partial);
        assert_eq!(decoded.records[0].value, PropertyValue::Opaque(vec![1, 2, 3]));
        assert_eq!(decoded.records[1].value, PropertyValue::U8(vec![9]));
        assert_eq!(
            decoded.warnings,
            vec![Warning::UnknownPropertyType {
                property_id: 0x10,
                type_tag: 0x0700,
                offset: 4,
            }]
        );
    }

    #[test]
    fn test_truncated_payload_is_partial() {
        let records = [
            record(0x10, type_tag::U8, FLAG_ARRAY, 1, &[1]),
            record(0x11, type_tag::U32, FLAG_ARRAY, 4, &[0; 6]),
        ];
        let decoded = decode(&block(&records)).unwrap();
        assert!(decoded.partial);
        assert_eq!(decoded.len(), 1);
        assert!(matches!(
            decoded.warnings.as_slice(),
            [Warning::ParseStopped { offset: 18, decoded: 1, declared: 2, .. }]
        ));
    }

    #[test]
    fn test_nonzero_padding_canonical_stops() {
        let mut bad = record(0x10, type_tag::U8, FLAG_ARRAY, 1, &[1]);
        bad[11] = 0x01;
        let decoded = decode(&block(&[bad])).unwrap();
        assert!(decoded.partial);
        assert!(decoded.is_empty());
        assert!(matches!(
            decoded.warnings[0],
            Warning::LayoutMismatch { property_id: 0x10, offset: 4 }
        ));
    }

    #[test]
    fn test_sniff_wide_count() {
        // 300 u8 values with a 32-bit count
        let mut rec = Vec::new();
        rec.extend_from_slice(&0x10u32.to_le_bytes());
        rec.extend_from_slice(&type_tag::U8.to_le_bytes());
        rec.extend_from_slice(&FLAG_ARRAY.to_le_bytes());
        rec.push(0);
        rec.extend_from_slice(&300u32.to_le_bytes());
        rec.extend_from_slice(&[5u8; 300]);

        let bytes = block(&[rec]);
        assert!(decode(&bytes).unwrap().partial);

        let options = DecodeOptions::new().layout(LayoutPolicy::Sniff);
        let decoded = decode_with(&bytes, &options).unwrap();
        assert!(!decoded.partial);
        assert_eq!(decoded.records[0].repetition, 300);
        assert_eq!(decoded.records[0].value, PropertyValue::U8(vec![5; 300]));
        assert!(matches!(decoded.warnings[0], Warning::WideCountLayout { .. }));
    }

    #[test]
    fn test_patch_layout_wide_count() {
        let mut rec = Vec::new();
        rec.extend_from_slice(&0x0062_E78Au32.to_le_bytes());
        rec.extend_from_slice(&type_tag::U32.to_le_bytes());
        rec.extend_from_slice(&FLAG_ARRAY.to_le_bytes());
        rec.push(0);
        rec.extend_from_slice(&300u32.to_le_bytes());
        rec.extend_from_slice(&[0x11; 1200]);

        let decoded = decode(&block(&[rec])).unwrap();
        assert!(!decoded.partial);
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.records[0].repetition, 300);
        assert_eq!(decoded.records[0].value.as_u32s().map(<[u32]>::len), Some(300));
    }

    #[test]
    fn test_patch_layout_ids_accept_canonical_records() {
        let payload: Vec<u8> = (0..300u32).flat_map(|i| i.to_le_bytes()).collect();
        let wide = record(0x0062_E78A, type_tag::U32, FLAG_ARRAY, 300, &payload);
        let narrow = record(0x699B_08A4, type_tag::F32, FLAG_ARRAY, 1, &2.5f32.to_le_bytes());
        let decoded = decode(&block(&[wide, narrow])).unwrap();

        assert!(!decoded.partial);
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.records[0].repetition, 300);
        assert_eq!(decoded.records[1].value, PropertyValue::F32(vec![2.5]));
    }

    #[test]
    fn test_sniff_scalar() {
        let mut rec = Vec::new();
        rec.extend_from_slice(&0x10u32.to_le_bytes());
        rec.extend_from_slice(&type_tag::U32.to_le_bytes());
        rec.extend_from_slice(&0u16.to_le_bytes());
        rec.push(0);
        rec.extend_from_slice(&0x1234_5678u32.to_le_bytes());

        let options = DecodeOptions::new().layout(LayoutPolicy::Sniff);
        let decoded = decode_with(&block(&[rec]), &options).unwrap();
        assert_eq!(decoded.records[0].value, PropertyValue::U32(vec![0x1234_5678]));
    }

    #[test]
    fn test_missing_count() {
        assert!(matches!(decode(&[1, 0]), Err(Error::TruncatedData { .. })));
    }

    #[test]
    fn test_declared_count_larger_than_data() {
        let decoded = decode(&u32::MAX.to_le_bytes()).unwrap();
        assert!(decoded.partial);
        assert_eq!(decoded.declared_count, u32::MAX);
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decode_resource() {
        let mut bytes = SubHeader::exemplar().to_bytes().to_vec();
        bytes.extend_from_slice(&block(&[record(
            0x20,
            type_tag::TEXT,
            FLAG_ARRAY,
            4,
            b"Farm",
        )]));
        let (header, decoded) = decode_resource(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(header, SubHeader::exemplar());
        assert_eq!(
            decoded.get(PropertyId::ExemplarName).unwrap().value.as_text(),
            Some("Farm")
        );
    }
}
