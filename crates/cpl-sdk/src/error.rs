use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Gateway(#[from] cpl_gateway::GatewayError),

    #[error("invalid asset record: {0}")]
    InvalidRecord(#[from] cpl_types::TypeError),

    /// A step of a scripted scenario did not behave as expected.
    #[error("unexpected outcome: {0}")]
    Unexpected(String),
}

impl SdkError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Gateway(err) if err.is_not_found())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
