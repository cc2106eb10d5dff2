use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of a failure raised by contract logic during simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// The addressed asset does not exist.
    NotFound,
    /// Unknown function or wrong argument count.
    InvalidArgument,
    /// Anything else (corrupt state, serialization).
    Internal,
}

/// Contract failure as reported back across the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaincodeFault {
    pub kind: FaultKind,
    pub message: String,
}

impl ChaincodeFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ChaincodeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("chaincode error: {0}")]
    Chaincode(ChaincodeFault),

    #[error("endorsement failed: {0}")]
    EndorsementFailed(String),

    #[error("ordering failed: {0}")]
    OrderingFailed(String),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(String),

    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("connection closed")]
    Closed,

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
