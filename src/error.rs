//! Error types for the context propagation agent.

use thiserror::Error;

/// Errors raised while establishing interception points
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("mandatory interception point '{operation}' could not be established: {reason}")]
    MandatoryHookFailed {
        operation: &'static str,
        reason: String,
    },

    #[error("install I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced to the embedding process at install time
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("installation failed: {0}")]
    Install(#[from] InstallError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),
}
