//! Error types for staging operations.

use thiserror::Error;

/// Errors that can occur while staging or reading back bodies.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The referenced blob was never staged in this namespace.
    #[error("blob not staged: {blob}")]
    Missing { blob: String },

    /// The blob id cannot be used by this backend.
    #[error("invalid blob id: {id:?}: {reason}")]
    InvalidBlobId { id: String, reason: &'static str },

    /// I/O failure in a filesystem-backed store.
    #[error("staging io: {0}")]
    Io(#[from] std::io::Error),

    /// A staged body could not be encoded or decoded.
    #[error("staged body codec: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Convenience alias for staging operations.
pub type StagingResult<T> = Result<T, StagingError>;
