//! High-level SDK for the CarbonPasture Ledger.
//!
//! Typed carbon-asset operations on top of the gateway session layer. This
//! is the entry point for applications embedding CPL.

pub mod asset_contract;
pub mod client;
pub mod error;
pub mod walkthrough;

pub use asset_contract::AssetContract;
pub use client::CarbonClient;
pub use error::{SdkError, SdkResult};
pub use walkthrough::{Step, Walkthrough};

// Re-export key types
pub use cpl_gateway::{ConnectionLifecycle, GatewayConfig, GatewayConnector, GatewayError};
pub use cpl_types::Asset;
