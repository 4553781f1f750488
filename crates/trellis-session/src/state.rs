//! The documents the session layer persists and passes around.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use trellis_compiler::{ResolvedSnapshot, Snapshot};

/// Where a session stands in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Accepting submissions.
    Open,
    /// Compiled clean; the snapshot is with the coordinator.
    Committed,
    /// Pushed downstream.
    Done,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Committed => f.write_str("committed"),
            Self::Done => f.write_str("done"),
        }
    }
}

/// Everything a session is, persisted as its context document.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub id: String,
    pub created_at: u64,
    pub phase: SessionPhase,
    /// Staging namespace holding this session's entity bodies.
    pub namespace: String,
    pub snapshot: Snapshot,
}

impl SessionContext {
    /// A fresh open session over `snapshot`.
    pub fn open(id: impl Into<String>, namespace: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            id: id.into(),
            created_at: unix_millis(),
            phase: SessionPhase::Open,
            namespace: namespace.into(),
            snapshot,
        }
    }
}

/// The coordinator's own context document: the counter feeding session ids.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorContext {
    pub nonce: u64,
}

/// Hand-off from a committed session to the coordinator's push.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    pub session_id: String,
    pub namespace: String,
    pub snapshot: ResolvedSnapshot,
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
