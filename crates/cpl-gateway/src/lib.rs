//! Gateway session layer for the CarbonPasture Ledger.
//!
//! Everything a client needs to talk to the ledger runtime lives here:
//!
//! - [`GatewayConfig`] -- connection parameters with defaults, a TOML file
//!   layer and environment overrides
//! - [`GatewayConnector`] -- loads the trust root, dials the peer, loads the
//!   identity and signer, and assembles a [`Session`]
//! - [`ConnectionLifecycle`] -- bounds session construction by a ceiling and
//!   guarantees the session is released on every exit path
//! - [`Contract`] -- evaluate / submit / submit-async dispatch with per-tier
//!   deadlines
//!
//! A [`Session`] exclusively owns its channel and client. [`Network`] and
//! [`Contract`] are views into it; once the session closes, calls through
//! them fail with [`GatewayError::Closed`].

pub mod config;
pub mod connector;
pub mod contract;
pub mod decode;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod material;
pub mod session;

pub use config::{DeadlineConfig, GatewayConfig};
pub use connector::GatewayConnector;
pub use contract::{Contract, SubmittedTransaction};
pub use decode::{decode_json, decode_utf8};
pub use error::{GatewayError, GatewayResult};
pub use identity::{Identity, Signer};
pub use lifecycle::ConnectionLifecycle;
pub use material::{write_dev_material, DevMaterial};
pub use session::{Channel, Gateway, Network, Session};
