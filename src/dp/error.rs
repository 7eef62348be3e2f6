//! Error types for the differential privacy core.

use thiserror::Error;

/// DP errors
#[derive(Debug, Error)]
pub enum DpError {
    #[error("invalid privacy budget: {0}")]
    InvalidBudget(String),

    #[error("invalid run shape: {0}")]
    InvalidRunShape(String),

    #[error("unrecognized accounting method tag: {0:?}")]
    UnknownMethod(String),

    #[error("unrecognized privacy mode tag: {0:?}")]
    UnknownMode(String),
}

/// Result type for DP operations
pub type Result<T> = std::result::Result<T, DpError>;
