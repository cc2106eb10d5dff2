/// Errors from world-state operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Keys must be non-empty.
    #[error("empty key")]
    EmptyKey,

    /// Range bounds are inverted.
    #[error("invalid range: start {start:?} is after end {end:?}")]
    InvalidRange { start: String, end: String },

    /// The backing state is no longer usable (e.g. a finished simulation).
    #[error("state closed")]
    Closed,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
