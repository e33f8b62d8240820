//! Error types for index operations.

use thiserror::Error;

/// Errors surfaced by the index. Nothing is retried internally.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Malformed coordinates, level bounds, limits or sort keys.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// `remove` on a key with no live entry, or a composite key miss in storage.
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Cursor token that cannot be decoded, was minted under a different
    /// configuration, or points outside the current query plan.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Opaque failure from the storage backend.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Config or cursor (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IndexError {
    /// Whether this is a `NotFound`, the one error hosts commonly swallow.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
