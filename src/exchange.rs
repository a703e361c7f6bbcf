//! JSON exchange records.
//!
//! Extraction tools dump decoded exemplars as JSON records that patch
//! generators read back. A record names the resource by instance id and maps
//! property names to their values:
//!
//! ```json
//! {
//!   "instance_id": "0x6A63633B",
//!   "size": 412,
//!   "properties": {
//!     "ExemplarName": "R$1_3x2",
//!     "ZoneWealth": [1],
//!     "GrowthStage": [3]
//!   }
//! }
//! ```
//!
//! Files written by older tools use `iid` instead of `instance_id`; both are
//! accepted when reading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::exemplar::{PropertyBlock, PropertyId, PropertyValue};
use crate::key::ResourceKey;
use crate::patch::PatchTarget;
use crate::{Error, Result};

/// A property value in an exchange record.
///
/// An empty list is always [`Integers`](Self::Integers), whatever the
/// property type, since JSON `[]` cannot tell the list kinds apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExchangeValue {
    /// Integer sequence (u8, u16 and u32 properties).
    Integers(Vec<u64>),
    /// Float sequence.
    Floats(Vec<f64>),
    /// Text, or lowercase hex for opaque bytes.
    Text(String),
}

impl From<&PropertyValue> for ExchangeValue {
    fn from(value: &PropertyValue) -> Self {
        match value {
            PropertyValue::F32(v) if v.is_empty() => ExchangeValue::Integers(Vec::new()),
            PropertyValue::F32(v) => ExchangeValue::Floats(v.iter().map(|&x| x as f64).collect()),
            PropertyValue::Text(s) => ExchangeValue::Text(s.clone()),
            PropertyValue::Opaque(bytes) => ExchangeValue::Text(to_hex(bytes)),
            other => ExchangeValue::Integers(other.to_integers().unwrap_or_default()),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// One decoded resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    /// Instance id as `0x`-prefixed upper-case hex.
    #[serde(alias = "iid")]
    pub instance_id: String,
    /// Stored size of the entry, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Property name (or hex id) to value.
    #[serde(default)]
    pub properties: BTreeMap<String, ExchangeValue>,
}

impl ExchangeRecord {
    /// Builds a record from a decoded block.
    ///
    /// Known properties are named; others are keyed by their hex id. When an
    /// id repeats, the first record wins.
    pub fn from_block(key: ResourceKey, block: &PropertyBlock) -> Self {
        let mut properties = BTreeMap::new();
        for record in block {
            properties
                .entry(record.id.to_string())
                .or_insert_with(|| ExchangeValue::from(&record.value));
        }
        Self {
            instance_id: format!("0x{:08X}", key.instance_id),
            size: None,
            properties,
        }
    }

    /// Sets the stored entry size.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Parses the instance id (`0x`-prefixed or bare hex).
    pub fn instance_id(&self) -> Result<u32> {
        let text = self.instance_id.trim();
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        u32::from_str_radix(digits, 16)
            .map_err(|e| Error::InvalidFormat(format!("bad instance id {:?}: {}", self.instance_id, e)))
    }

    /// Returns the value of a property.
    pub fn get(&self, id: PropertyId) -> Option<&ExchangeValue> {
        self.properties.get(&id.to_string())
    }

    /// The exemplar this record describes, as a patch target in `group_id`.
    pub fn target(&self, group_id: u32) -> Result<PatchTarget> {
        Ok(PatchTarget::new(group_id, self.instance_id()?))
    }
}

/// Serializes records as pretty-printed JSON.
pub fn to_json(records: &[ExchangeRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parses a JSON array of records.
pub fn from_json(text: &str) -> Result<Vec<ExchangeRecord>> {
    Ok(serde_json::from_str(text)?)
}
