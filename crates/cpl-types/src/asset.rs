use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::credits::parse_credits;
use crate::error::TypeError;

/// Field names accepted in place of the canonical ones on older records,
/// as `(canonical, legacy)` pairs.
pub const LEGACY_ALIASES: [(&str, &str); 4] = [
    ("SequestrationType", "Color"),
    ("CarbonCredits", "Size"),
    ("FarmerID", "Owner"),
    ("IssuanceDate", "AppraisedValue"),
];

/// A carbon-credit asset as stored on the ledger.
///
/// Serializes with the canonical ledger field names in ledger order. The
/// credit amount is `None` when the value written could not be coerced to an
/// integer; it is then stored as JSON `null`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "SequestrationType")]
    pub sequestration_type: String,
    #[serde(rename = "CarbonCredits")]
    pub carbon_credits: Option<i64>,
    #[serde(rename = "FarmerID")]
    pub farmer_id: String,
    #[serde(rename = "IssuanceDate")]
    pub issuance_date: String,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        sequestration_type: impl Into<String>,
        carbon_credits: Option<i64>,
        farmer_id: impl Into<String>,
        issuance_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            sequestration_type: sequestration_type.into(),
            carbon_credits,
            farmer_id: farmer_id.into(),
            issuance_date: issuance_date.into(),
        }
    }

    /// Decode a record that may predate the carbon schema.
    ///
    /// Each canonical field is taken when present and non-null; otherwise its
    /// legacy alias from [`LEGACY_ALIASES`] is used. Numbers found in text
    /// fields are rendered in decimal, and textual credit amounts go through
    /// [`parse_credits`]. Only `ID` is mandatory.
    pub fn from_record(record: &Value) -> Result<Self, TypeError> {
        let map = record.as_object().ok_or(TypeError::NotAnObject)?;
        let id = map
            .get("ID")
            .and_then(value_as_text)
            .ok_or(TypeError::MissingField("ID"))?;

        Ok(Self {
            id,
            sequestration_type: aliased(map, 0).and_then(value_as_text).unwrap_or_default(),
            carbon_credits: aliased(map, 1).and_then(value_as_credits),
            farmer_id: aliased(map, 2).and_then(value_as_text).unwrap_or_default(),
            issuance_date: aliased(map, 3).and_then(value_as_text).unwrap_or_default(),
        })
    }

    /// Canonical JSON encoding, as written to the ledger.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TypeError> {
        serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }
}

fn aliased(map: &Map<String, Value>, index: usize) -> Option<&Value> {
    let (canonical, legacy) = LEGACY_ALIASES[index];
    match map.get(canonical) {
        Some(Value::Null) | None => map.get(legacy).filter(|v| !v.is_null()),
        present => present,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_as_credits(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_credits(s),
        _ => None,
    }
}
