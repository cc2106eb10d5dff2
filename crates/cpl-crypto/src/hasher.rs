use cpl_types::TxId;
use rand::RngCore;

/// Length of a proposal nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Random per-proposal nonce.
pub type Nonce = [u8; NONCE_LEN];

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a proposal digest can never collide with a transaction id
/// computed over the same bytes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Transaction identifiers (nonce ‖ creator).
    pub const TX_ID: Self = Self {
        domain: "cpl-txid-v1",
    };
    /// Bytes signed by a client for a proposal or transaction envelope.
    pub const SIGNED_PAYLOAD: Self = Self {
        domain: "cpl-signed-v1",
    };
    /// Bytes signed by a peer for an endorsement.
    pub const ENDORSEMENT: Self = Self {
        domain: "cpl-endorsement-v1",
    };

    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        self.hash_parts(&[data])
    }

    /// Hash several byte strings as one message. Each part is length-prefixed
    /// so that `["ab", "c"]` and `["a", "bc"]` hash differently.
    pub fn hash_parts(&self, parts: &[&[u8]]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        for part in parts {
            hasher.update(&(part.len() as u64).to_be_bytes());
            hasher.update(part);
        }
        *hasher.finalize().as_bytes()
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    /// Derive the transaction id for a proposal from its nonce and the
    /// serialized creator identity.
    pub fn tx_id(nonce: &Nonce, creator: &[u8]) -> TxId {
        TxId::from_digest(Self::TX_ID.hash_parts(&[nonce, creator]))
    }

    /// Fresh random nonce from the thread-local CSPRNG.
    pub fn nonce() -> Nonce {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        nonce
    }
}
