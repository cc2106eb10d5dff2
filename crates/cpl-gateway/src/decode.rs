use serde::de::DeserializeOwned;

use crate::error::{GatewayError, GatewayResult};

/// Decode a result payload as UTF-8 text.
pub fn decode_utf8(bytes: &[u8]) -> GatewayResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| GatewayError::Decode(format!("payload is not UTF-8: {e}")))
}

/// Decode a result payload as UTF-8 JSON.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> GatewayResult<T> {
    let text = decode_utf8(bytes)?;
    serde_json::from_str(&text).map_err(|e| GatewayError::Decode(format!("payload is not JSON: {e}")))
}
