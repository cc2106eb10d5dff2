use std::sync::Arc;

use async_trait::async_trait;
use cpl_types::TxId;

use crate::endpoint::{Endpoint, TlsRootCert};
use crate::error::ProtocolResult;
use crate::message::{CommitStatus, Envelope, ProposalResponse, SignedProposal};

/// Establishes secured connections to a ledger peer.
///
/// Implementations must authenticate the remote against `trust_root` and the
/// endpoint's host alias before returning.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        trust_root: &TlsRootCert,
    ) -> ProtocolResult<Arc<dyn Connection>>;
}

/// An open connection to a peer and, through it, the ordering service.
///
/// None of these calls carries its own deadline: callers bound every await.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Resolve once the connection is usable.
    async fn ready(&self) -> ProtocolResult<()>;

    /// Simulate a proposal and return only its result. Nothing is ordered.
    async fn evaluate(&self, proposal: SignedProposal) -> ProtocolResult<Vec<u8>>;

    /// Simulate a proposal and return the endorsed response.
    async fn endorse(&self, proposal: SignedProposal) -> ProtocolResult<ProposalResponse>;

    /// Hand an endorsed transaction to the ordering service.
    async fn submit(&self, envelope: Envelope) -> ProtocolResult<()>;

    /// Wait for the commit status of a previously submitted transaction.
    async fn commit_status(&self, channel: &str, tx_id: &TxId) -> ProtocolResult<CommitStatus>;

    /// Release the connection. Subsequent calls fail with `Closed`.
    fn close(&self);
}
