use thiserror::Error;

use trellis_protocol::ProtocolError;
use trellis_staging::StagingError;

use crate::state::SessionPhase;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session '{id}'")]
    NoSuchSession { id: String },

    #[error("session '{id}' is {phase} and accepts no further submissions")]
    SessionSpent { id: String, phase: SessionPhase },

    #[error("operation '{op}' must target the coordinator, not '{target}'")]
    NotCoordinator { op: &'static str, target: String },

    #[error("unknown operation '{op}'")]
    UnknownOperation { op: String },

    #[error("payload rejected: {0}")]
    Payload(#[from] ProtocolError),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    #[error("context error: {0}")]
    Context(#[from] ContextError),

    #[error("staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("context document not decodable: {0}")]
    ContextCodec(#[from] serde_json::Error),
}

/// Errors from the distributed lock service.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock '{key}' not acquired within {waited_ms} ms")]
    AcquireTimeout { key: String, waited_ms: u64 },

    #[error("lease on '{key}' expired or was superseded")]
    StaleLease { key: String },
}

/// Errors from the durable context store.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("context backend: {0}")]
    Backend(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
