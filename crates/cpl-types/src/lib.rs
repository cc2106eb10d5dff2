//! Foundation types for the CarbonPasture Ledger (CPL).
//!
//! Every other CPL crate depends on `cpl-types`.
//!
//! # Key Types
//!
//! - [`Asset`] -- a carbon-credit record as stored on the ledger
//! - [`parse_credits`] -- integer-prefix coercion applied to credit amounts
//! - [`TxId`] -- hex-encoded transaction identifier

pub mod asset;
pub mod credits;
pub mod error;
pub mod tx;

pub use asset::{Asset, LEGACY_ALIASES};
pub use credits::parse_credits;
pub use error::TypeError;
pub use tx::TxId;
