//! Property block encoder for exemplar patches.
//!
//! Only the fixed two-record schema consumed by the game's exemplar patch
//! loader is produced. Its bytes must match exactly:
//!
//! ```text
//! count           02 00 00 00
//! targets         8A E7 62 00 | 00 03 80 00 | 00 | 2n (u32 LE) | (group, instance) * n
//! override        A4 08 9B 69 | 00 09 80 00 | 00 | 01 00 00 00 | value (f32 LE)
//! ```
//!
//! The decoder reads the wide counts back through
//! [`DecodeStrategy::PatchLayout`](super::DecodeStrategy::PatchLayout).

use super::PropertyId;

const TARGETS_TYPE_AND_FLAGS: [u8; 4] = [0x00, 0x03, 0x80, 0x00];
const FLOAT_TYPE_AND_FLAGS: [u8; 4] = [0x00, 0x09, 0x80, 0x00];

/// Encodes a patch property block: the target list, then the override value.
///
/// `targets` are `(group_id, instance_id)` pairs. The targets record must
/// come first.
pub fn encode(targets: &[(u32, u32)], override_value: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 13 + targets.len() * 8 + 17);
    out.extend_from_slice(&2u32.to_le_bytes());

    out.extend_from_slice(&PropertyId::ExemplarPatchTargets.raw().to_le_bytes());
    out.extend_from_slice(&TARGETS_TYPE_AND_FLAGS);
    out.push(0);
    out.extend_from_slice(&((targets.len() * 2) as u32).to_le_bytes());
    for &(group, instance) in targets {
        out.extend_from_slice(&group.to_le_bytes());
        out.extend_from_slice(&instance.to_le_bytes());
    }

    out.extend_from_slice(&PropertyId::MinSlope.raw().to_le_bytes());
    out.extend_from_slice(&FLOAT_TYPE_AND_FLAGS);
    out.push(0);
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&override_value.to_le_bytes());
    out
}
