//! World-state storage for the CarbonPasture Ledger.
//!
//! The ledger is an ordered mapping from string keys to opaque bytes. This
//! crate provides the capability contract logic is written against and the
//! backends that satisfy it.
//!
//! # Backends
//!
//! - [`MemoryState`] -- plain `BTreeMap` state for unit tests and embedding
//! - [`VersionedStore`] -- committed peer state where every key carries the
//!   [`Version`] of the transaction that last wrote it
//!
//! # Design Rules
//!
//! 1. Keys iterate in lexicographic byte order.
//! 2. A stored empty value is indistinguishable from an absent key to readers
//!    that check presence.
//! 3. The store never interprets values.
//! 4. All errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod rwset;
pub mod traits;
pub mod versioned;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryState;
pub use rwset::{KvRead, KvWrite, ReadWriteSet};
pub use traits::WorldState;
pub use versioned::{Version, VersionedStore, VersionedValue};
