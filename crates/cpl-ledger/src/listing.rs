use serde::Serialize;
use serde_json::Value;

/// One entry of a full ledger listing.
///
/// Values that parse as JSON are returned structurally; anything else is
/// returned as the stored text so a single bad entry does not abort the scan.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListEntry {
    Record(Value),
    Raw(String),
}

impl ListEntry {
    pub(crate) fn decode(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Self::Record(value),
            Err(err) => {
                tracing::debug!(error = %err, "list entry is not JSON, keeping raw text");
                Self::Raw(text.into_owned())
            }
        }
    }

    pub fn as_record(&self) -> Option<&Value> {
        match self {
            Self::Record(v) => Some(v),
            Self::Raw(_) => None,
        }
    }
}
