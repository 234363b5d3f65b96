//! Typed errors surfaced by the shim.
//!
//! Plugin-facing failures stay recoverable: handlers convert storage and
//! permission errors into falsy replies, and only strict mode hands
//! `ShimError::Unsupported` back to the caller.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShimError {
    /// The path resolved to nothing callable on this page.
    #[error("{path}() is not supported in web environment")]
    Unsupported { path: String },
    #[error("{capability}() requires clipboard permission in web environment")]
    PermissionDenied { capability: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ShimError {
    pub fn unsupported(path: impl ToString) -> Self {
        ShimError::Unsupported {
            path: path.to_string(),
        }
    }
}

/// Failures raised by a [`crate::storage::KeyValueStorage`] backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },
    #[error("serialization failed: {0}")]
    Serialization(String),
    #[error("stored value under '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

impl StorageError {
    /// DOMException-style name carried in failed `DbReturn` records.
    pub fn name(&self) -> &'static str {
        match self {
            StorageError::QuotaExceeded { .. } => "QuotaExceededError",
            StorageError::Serialization(_) => "DataCloneError",
            StorageError::Corrupt { .. } => "SyntaxError",
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
