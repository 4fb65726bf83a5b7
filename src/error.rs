use alloy::primitives::U256;
use thiserror::Error;

/// Fatal, pre-run errors. Nothing is scheduled when one of these surfaces.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Per-account errors. These are contained at the executor boundary and
/// never abort the run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("proxy unreachable: {0}")]
    ProxyUnreachable(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("insufficient funds: available {available} wei, required {required} wei")]
    InsufficientFunds { available: U256, required: U256 },
    #[error("submission error: {0}")]
    Submission(String),
    #[error("confirmation error: {0}")]
    Confirmation(String),
}

impl TaskError {
    /// Submission failures are the only class that earns a resubmission
    /// attempt; everything else propagates on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Submission(_))
    }
}
