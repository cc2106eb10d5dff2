use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record is missing field {0}")]
    MissingField(&'static str),

    #[error("serialization error: {0}")]
    Serialization(String),
}
