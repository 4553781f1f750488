//! Reply documents for the session operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome tag carried by `add` and `commit` replies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// Reply to `begin`: the freshly allocated session id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeginReply {
    pub id: String,
}

/// Reply to `add`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddReply {
    pub status: Status,
}

impl AddReply {
    pub fn ok() -> Self {
        Self { status: Status::Ok }
    }
}

/// Reply to `commit`. A failed status carries the validation error text in
/// `result`; the session stays open for correction and recommit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReply {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl CommitReply {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            result: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            result: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
