//! Error types for the conversation store.

use thiserror::Error;

/// Conversation store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The user id cannot be used as a database path segment.
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),
    /// Transport-level failure talking to the database.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// The database answered with a non-success status.
    #[error("database returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// Stored payload is not a transcript document.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// URL construction failed.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
