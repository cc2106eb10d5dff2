use std::time::Duration;

use cpl_protocol::{FaultKind, ProtocolError, TxValidationCode};
use cpl_types::TxId;
use thiserror::Error;

/// Errors surfaced by the gateway layer.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or malformed connection material or settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// The private key could not be parsed, or signing failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The ledger reported that the addressed asset does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A submitted transaction was not committed successfully.
    #[error("transaction {tx_id} failed: {reason}")]
    Commit {
        tx_id: TxId,
        code: Option<TxValidationCode>,
        reason: String,
    },

    /// A payload could not be decoded as text or JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// The contract refused an evaluation for a reason other than a missing
    /// asset.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    /// A view was used after its session closed.
    #[error("session closed")]
    Closed,
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Validation code of a failed commit, if the failure came from one.
    pub fn commit_code(&self) -> Option<TxValidationCode> {
        match self {
            Self::Commit { code, .. } => *code,
            _ => None,
        }
    }

    /// Re-classify a transport error raised while submitting `tx_id`.
    ///
    /// A missing asset and a closed session keep their own kinds; every
    /// other failure becomes a commit error.
    pub(crate) fn during_submit(err: ProtocolError, tx_id: &TxId) -> Self {
        match Self::from(err) {
            err @ (Self::NotFound(_) | Self::Closed | Self::Timeout { .. }) => err,
            other => Self::Commit {
                tx_id: tx_id.clone(),
                code: None,
                reason: other.to_string(),
            },
        }
    }
}

impl From<ProtocolError> for GatewayError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Chaincode(fault) if fault.kind == FaultKind::NotFound => {
                Self::NotFound(fault.message)
            }
            ProtocolError::Chaincode(fault) => Self::Rejected(fault.message),
            ProtocolError::EndorsementFailed(msg) | ProtocolError::OrderingFailed(msg) => {
                Self::Rejected(msg)
            }
            ProtocolError::Closed => Self::Closed,
            ProtocolError::TlsHandshake(_) | ProtocolError::Unavailable(_) => {
                Self::Unavailable(err.to_string())
            }
            ProtocolError::MessageTooLarge { .. }
            | ProtocolError::Serialization(_)
            | ProtocolError::Deserialization(_) => Self::Decode(err.to_string()),
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
