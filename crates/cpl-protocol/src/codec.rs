use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::MAX_MESSAGE_SIZE;

/// Binary encoding for protocol messages.
///
/// Signatures are always computed over these bytes, so encoding must be
/// deterministic for a given value.
pub struct WireCodec;

impl WireCodec {
    pub fn encode<T: Serialize>(msg: &T) -> ProtocolResult<Vec<u8>> {
        let payload =
            bincode::serialize(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(payload)
    }

    pub fn decode<T: DeserializeOwned>(data: &[u8]) -> ProtocolResult<T> {
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: data.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        bincode::deserialize(data).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Proposal, SerializedIdentity};

    #[test]
    fn proposal_encoding_is_deterministic() {
        let proposal = Proposal::new(
            "mychannel",
            "carboncc",
            "ReadAsset",
            vec!["a1".into()],
            SerializedIdentity::new("Org1MSP", b"cert".to_vec()),
        );
        let a = WireCodec::encode(&proposal).unwrap();
        let b = WireCodec::encode(&proposal).unwrap();
        assert_eq!(a, b);
        let back: Proposal = WireCodec::decode(&a).unwrap();
        assert_eq!(back, proposal);
    }

    #[test]
    fn truncated_input_fails() {
        let result: ProtocolResult<Proposal> = WireCodec::decode(&[1, 2, 3]);
        assert!(matches!(result, Err(ProtocolError::Deserialization(_))));
    }
}
