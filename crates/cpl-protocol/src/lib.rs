//! Wire protocol for the CarbonPasture Ledger.
//!
//! Defines the messages exchanged between a gateway client and the ledger
//! runtime (signed proposals, endorsed responses, transaction envelopes and
//! commit statuses), their binary encoding, and the [`Connector`] /
//! [`Connection`] traits every transport implements.

pub mod codec;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod transport;

pub use codec::WireCodec;
pub use endpoint::{Endpoint, TlsRootCert};
pub use error::{ChaincodeFault, FaultKind, ProtocolError, ProtocolResult};
pub use message::{
    CommitStatus, Endorsement, Envelope, Proposal, ProposalResponse, SerializedIdentity,
    SignedProposal, TxValidationCode, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
pub use transport::{Connection, Connector};

pub use cpl_store::{KvRead, KvWrite, ReadWriteSet, Version};
