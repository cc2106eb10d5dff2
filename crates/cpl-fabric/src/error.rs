use cpl_protocol::ProtocolError;

/// Errors produced by the runtime.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// The channel is not hosted by this network.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// The chaincode is not deployed on the channel.
    #[error("chaincode {chaincode} is not deployed on channel {channel}")]
    UnknownChaincode { channel: String, chaincode: String },

    /// The ordering service has stopped and cannot accept transactions.
    #[error("ordering service is shut down")]
    Shutdown,

    /// Wire-level failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<FabricError> for ProtocolError {
    fn from(err: FabricError) -> Self {
        match err {
            FabricError::Protocol(inner) => inner,
            FabricError::Shutdown => ProtocolError::OrderingFailed(err.to_string()),
            FabricError::UnknownChannel(_) | FabricError::UnknownChaincode { .. } => {
                ProtocolError::EndorsementFailed(err.to_string())
            }
        }
    }
}

/// Convenience alias used throughout the fabric crate.
pub type Result<T> = std::result::Result<T, FabricError>;
