//! Error types for the store module.

use thiserror::Error;

use driftlog_core::EntryId;

/// Errors that can occur during block store and snapshot operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No block exists for this content id.
    ///
    /// During replication this is not fatal: the branch of history
    /// behind the missing block stays unmerged and can complete later.
    #[error("block not found: {0:?}")]
    NotFound(EntryId),

    /// Serialization or deserialization failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// I/O error reading or writing persisted state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
