//! Error types for the driftlog database.

use thiserror::Error;

/// Errors surfaced by the database API.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The database was constructed with an unusable configuration.
    ///
    /// Fails fast at open time and is fatal to that instance only.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A local append was rejected.
    #[error(transparent)]
    Append(#[from] driftlog_core::AppendError),

    /// Block store failure.
    #[error(transparent)]
    Store(#[from] driftlog_store::StoreError),

    /// Replication failure.
    #[error(transparent)]
    Replication(#[from] driftlog_replication::ReplicationError),

    /// Persisted state could not be decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
