//! Cryptographic primitives for the CarbonPasture Ledger.
//!
//! Provides Ed25519 signing keys loaded from PKCS#8 PEM files,
//! signature verification, and domain-separated BLAKE3 digests used for
//! transaction identifiers and signed payloads.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;
pub mod signer;

pub use hasher::{ContentHasher, Nonce, NONCE_LEN};
pub use signer::{Signature, SignatureError, SigningKey, VerifyingKey};
