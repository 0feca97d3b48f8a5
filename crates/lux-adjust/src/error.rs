//! Error types for adjustment parsing.

use thiserror::Error;

/// Error type for adjustment operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdjustError {
    /// Override mode string is neither `delta` nor `absolute`.
    #[error("invalid override mode: {0:?} (expected \"delta\" or \"absolute\")")]
    InvalidMode(String),
}

/// Result type for adjustment operations.
pub type AdjustResult<T> = Result<T, AdjustError>;
