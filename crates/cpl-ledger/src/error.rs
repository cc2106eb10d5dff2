use cpl_store::StoreError;

/// Errors raised by ledger operations.
///
/// These are the authoritative results of a transaction: callers surface
/// them unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("asset {id} does not exist")]
    NotFound { id: String },

    #[error("asset {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} arguments, got {actual}")]
    Arity {
        function: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("state error: {0}")]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
