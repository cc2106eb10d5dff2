//! Carbon-credit asset state machine for the CarbonPasture Ledger (CPL).
//!
//! This crate holds the transition logic that the ledger runtime executes for
//! every transaction. It has no network or identity concerns: every operation
//! runs against an injected [`cpl_store::WorldState`] capability, so the same
//! code is driven by an endorsing peer's simulator in production and by a
//! [`cpl_store::MemoryState`] in tests.
//!
//! - [`AssetLedger`] exposes the typed operations
//! - [`invoke`] is the named invocation surface (`CreateAsset`, `ReadAsset`, ...)
//! - [`seed_assets`] is the fixed data set written by `InitLedger`

pub mod error;
pub mod invoke;
pub mod ledger;
pub mod listing;
pub mod seed;

pub use error::{LedgerError, LedgerResult};
pub use invoke::{invoke, Function};
pub use ledger::AssetLedger;
pub use listing::ListEntry;
pub use seed::seed_assets;
