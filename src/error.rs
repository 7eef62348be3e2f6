//! Crate-level error type.

use thiserror::Error;

/// Errors surfaced by privatizar
#[derive(Debug, Error)]
pub enum Error {
    #[error("inputs and targets differ in length: {inputs} inputs vs {targets} targets")]
    LengthMismatch { inputs: usize, targets: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("training loss became non-finite at epoch {epoch}")]
    Diverged { epoch: usize },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid dataset: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Dp(#[from] crate::dp::DpError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for privatizar operations
pub type Result<T> = std::result::Result<T, Error>;
