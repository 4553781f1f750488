//! Durable per-target context documents.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ContextError;

/// Durable storage holding one JSON document per target id.
///
/// The coordinator's counter and every session's accumulated state live
/// here; dispatchers keep no state of their own between operations, so any
/// dispatcher over the same store can serve any session.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Load the document stored for `target`, if any.
    async fn load(&self, target: &str) -> Result<Option<Value>, ContextError>;

    /// Store the document for `target`, replacing whatever was there.
    async fn store(&self, target: &str, document: Value) -> Result<(), ContextError>;
}

/// Process-local context store for tests and embedding.
#[derive(Default)]
pub struct InMemoryContextStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, target: &str) -> bool {
        self.documents
            .read()
            .expect("lock poisoned")
            .contains_key(target)
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn load(&self, target: &str) -> Result<Option<Value>, ContextError> {
        Ok(self
            .documents
            .read()
            .expect("lock poisoned")
            .get(target)
            .cloned())
    }

    async fn store(&self, target: &str, document: Value) -> Result<(), ContextError> {
        self.documents
            .write()
            .expect("lock poisoned")
            .insert(target.to_string(), document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn store_replaces_and_load_reads_back() {
        let store = InMemoryContextStore::new();
        assert_eq!(store.load("a").await.unwrap(), None);

        store.store("a", json!({"n": 1})).await.unwrap();
        store.store("a", json!({"n": 2})).await.unwrap();
        assert_eq!(store.load("a").await.unwrap(), Some(json!({"n": 2})));
        assert_eq!(store.len(), 1);
        assert!(store.contains("a"));
        assert!(!store.contains("b"));
    }
}
