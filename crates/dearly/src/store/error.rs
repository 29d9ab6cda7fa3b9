//! Store error types.

use thiserror::Error;

/// Errors from the hosted diary store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse store response: {0}")]
    Parse(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
