use thiserror::Error;

use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("entity of {bytes} bytes can never fit the {limit} byte submission limit")]
    EntryTooLarge { bytes: usize, limit: usize },

    #[error("commit failed: {reason}")]
    CommitFailed { reason: String },

    #[error("dispatcher allocated an empty session id")]
    EmptySessionId,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
