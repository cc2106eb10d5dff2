//! In-process ledger runtime for the CarbonPasture Ledger.
//!
//! Stands in for the external peer and ordering service so the gateway can
//! be exercised end to end without a deployed network. The runtime keeps the
//! same observable contract a real network has:
//!
//! - proposals are simulated against committed state by an endorsing
//!   [`Peer`], which records a read/write set and signs the result;
//! - endorsed transactions are sequenced into blocks by an
//!   [`OrderingService`] running on its own task;
//! - the committer validates every transaction of a block in order
//!   (duplicate id, creator signature, endorsement, MVCC read versions) and
//!   publishes one [`cpl_protocol::CommitStatus`] per transaction.
//!
//! It is not a consensus implementation: there is one orderer and one peer.

pub mod channel;
pub mod error;
pub mod network;
pub mod orderer;
pub mod peer;
pub mod simulator;
pub mod status;

pub use channel::ChannelLedger;
pub use error::{FabricError, Result};
pub use network::{generate_ca_pem, LocalConnection, LocalNetwork, LocalNetworkBuilder};
pub use orderer::{OrdererConfig, OrderingService};
pub use peer::Peer;
pub use simulator::TxSimulator;
pub use status::{StatusBoard, StatusFilter};
