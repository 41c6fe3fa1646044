//! Structured error type shared by every pipeline stage.

use thiserror::Error;

/// Errors raised while ingesting a price point.
///
/// Displayable as-is in CLI output and log lines.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("storage write failed for '{key}': {reason}")]
    StorageWrite { key: String, reason: String },

    #[error("storage read failed: {0}")]
    StorageRead(String),
}

impl IngestError {
    pub(crate) fn storage(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        IngestError::StorageWrite {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
