//! Error types for the store module.

use chaintree_core::{ContentId, CoreError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No block with this id is stored.
    #[error("block not found: {0}")]
    NotFound(ContentId),

    /// A block's declared id does not match the hash of its bytes.
    #[error("block id mismatch: declared {declared}, computed {computed}")]
    IdMismatch {
        declared: ContentId,
        computed: ContentId,
    },

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored bytes could not be encoded or decoded as a node.
    #[error("codec error: {0}")]
    Codec(#[from] CoreError),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
