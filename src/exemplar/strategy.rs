//! Per-property decoding strategies.
//!
//! A few property ids do not follow the canonical record layout. They are
//! listed here explicitly; every other id decodes with
//! [`DecodeStrategy::Standard`].

use super::PropertyId;

/// How a property record is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeStrategy {
    /// Canonical layout: repetition count, three zero padding bytes, payload.
    Standard,
    /// For `0x0100` (u8) records the single value is the low byte of the
    /// repetition field. The record is 10 bytes long with no payload.
    ValueInCount,
    /// Canonical layout, but non-zero padding is tolerated.
    PaddingExempt,
    /// Array records whose ninth byte is zero carry a u32 LE count at bytes
    /// 9..13, as the patch encoder writes them. Other records decode as
    /// [`Standard`](Self::Standard).
    PatchLayout,
}

/// Ids that do not use [`DecodeStrategy::Standard`].
pub const STRATEGY_TABLE: &[(PropertyId, DecodeStrategy)] = &[
    (PropertyId::GrowthStage, DecodeStrategy::ValueInCount),
    (PropertyId::RoadCornerIndicator, DecodeStrategy::ValueInCount),
    (PropertyId::ExemplarName, DecodeStrategy::PaddingExempt),
    (PropertyId::ExemplarPatchTargets, DecodeStrategy::PatchLayout),
    (PropertyId::MinSlope, DecodeStrategy::PatchLayout),
];

/// Returns the decoding strategy for a property id.
pub fn strategy_for(id: PropertyId) -> DecodeStrategy {
    STRATEGY_TABLE
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, strategy)| *strategy)
        .unwrap_or(DecodeStrategy::Standard)
}
