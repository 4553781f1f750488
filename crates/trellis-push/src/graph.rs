//! The downstream graph store contract.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PushError;

/// The two creation calls the downstream store must offer.
///
/// Both are assumed idempotent under re-invocation with the same
/// arguments; push may deliver an entity more than once across retries of
/// a whole batch, never less than once for a batch that completed.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Create (or re-create) a node with the given body.
    async fn create_object(&self, id: &str, body: Value) -> Result<(), PushError>;

    /// Create (or re-create) a link between two nodes.
    async fn create_link(
        &self,
        from: &str,
        to: &str,
        kind: &str,
        body: Value,
    ) -> Result<(), PushError>;
}

/// One recorded downstream call.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphOp {
    CreateObject {
        id: String,
        body: Value,
    },
    CreateLink {
        from: String,
        to: String,
        kind: String,
        body: Value,
    },
}

/// A [`GraphStore`] that records every call, for tests and embedding.
///
/// Ids listed via [`fail_on`](Self::fail_on) are rejected (links by their
/// `from/to` pair), so partial-failure handling can be exercised.
#[derive(Debug, Default)]
pub struct RecordingGraphStore {
    ops: Mutex<Vec<GraphOp>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject future creates for `key`: an object id, or `from/to` for a
    /// link.
    pub fn fail_on(&self, key: impl Into<String>) {
        self.failing
            .lock()
            .expect("lock poisoned")
            .insert(key.into());
    }

    /// Every call recorded so far, in arrival order.
    pub fn ops(&self) -> Vec<GraphOp> {
        self.ops.lock().expect("lock poisoned").clone()
    }

    /// Ids of recorded object creates, in arrival order.
    pub fn object_ids(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                GraphOp::CreateObject { id, .. } => Some(id),
                GraphOp::CreateLink { .. } => None,
            })
            .collect()
    }

    pub fn contains_object(&self, id: &str) -> bool {
        self.object_ids().iter().any(|recorded| recorded == id)
    }

    /// The kind and body of the recorded link for `from -> to`.
    pub fn link(&self, from: &str, to: &str) -> Option<(String, Value)> {
        self.ops().into_iter().find_map(|op| match op {
            GraphOp::CreateLink {
                from: f,
                to: t,
                kind,
                body,
            } if f == from && t == to => Some((kind, body)),
            _ => None,
        })
    }

    pub fn link_count(&self) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, GraphOp::CreateLink { .. }))
            .count()
    }

    /// Position of an object create in the arrival order.
    pub fn object_position(&self, id: &str) -> Option<usize> {
        self.ops().iter().position(|op| {
            matches!(op, GraphOp::CreateObject { id: recorded, .. } if recorded == id)
        })
    }

    fn is_failing(&self, key: &str) -> bool {
        self.failing.lock().expect("lock poisoned").contains(key)
    }
}

#[async_trait]
impl GraphStore for RecordingGraphStore {
    async fn create_object(&self, id: &str, body: Value) -> Result<(), PushError> {
        if self.is_failing(id) {
            return Err(PushError::downstream(format!("object '{id}' rejected")));
        }
        self.ops
            .lock()
            .expect("lock poisoned")
            .push(GraphOp::CreateObject {
                id: id.to_string(),
                body,
            });
        Ok(())
    }

    async fn create_link(
        &self,
        from: &str,
        to: &str,
        kind: &str,
        body: Value,
    ) -> Result<(), PushError> {
        if self.is_failing(&format!("{from}/{to}")) {
            return Err(PushError::downstream(format!(
                "link '{from}/{to}' rejected"
            )));
        }
        self.ops
            .lock()
            .expect("lock poisoned")
            .push(GraphOp::CreateLink {
                from: from.to_string(),
                to: to.to_string(),
                kind: kind.to_string(),
                body,
            });
        Ok(())
    }
}
