//! Error types for the replication module.

use thiserror::Error;

/// Errors that can occur during replication.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// Transport-level failure (publish or subscribe).
    #[error("transport error: {0}")]
    Transport(String),

    /// A message could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// A message violated protocol limits.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Block store failure.
    #[error("store error: {0}")]
    Store(#[from] driftlog_store::StoreError),
}

/// Result type for replication operations.
pub type Result<T> = std::result::Result<T, ReplicationError>;
