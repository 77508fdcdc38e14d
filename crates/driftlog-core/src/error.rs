//! Error types for driftlog-core.

use thiserror::Error;

use crate::crypto::PublicKey;

/// Low-level errors from crypto and codec primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("malformed id: {0}")]
    MalformedId(String),

    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Validation errors for entry structure and signatures.
///
/// An entry failing any of these never enters a log.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature verification failed")]
    SignatureFailed,

    #[error("unsupported entry version: {0}")]
    UnsupportedVersion(u8),

    #[error("clock id does not match entry author")]
    ClockAuthorMismatch,

    #[error("parent refs exceed maximum of {max}: {got}")]
    TooManyParents { max: usize, got: usize },

    #[error("parent refs must be sorted and unique")]
    UnsortedParents,

    #[error("root entry must have clock time 0, got {0}")]
    RootWithTime(u64),

    #[error("non-root entry must have clock time > 0")]
    ZeroTimeWithParents,

    #[error("structural error: {0}")]
    StructuralError(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSignature | CoreError::InvalidPublicKey => {
                ValidationError::SignatureFailed
            }
            CoreError::MalformedId(msg)
            | CoreError::MalformedEntry(msg)
            | CoreError::DecodingError(msg) => ValidationError::StructuralError(msg),
        }
    }
}

/// Errors from a local append.
///
/// A denial from the access controller is a normal rejection outcome: the
/// log is left unchanged and no shared state is corrupted.
#[derive(Debug, Error)]
pub enum AppendError {
    #[error("identity {0} is not allowed to append to this log")]
    PermissionDenied(PublicKey),
}
