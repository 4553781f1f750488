//! In-memory staging for tests and embedding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde_json::Value;

use trellis_model::{is_empty_document, BlobRef};

use crate::error::{StagingError, StagingResult};
use crate::traits::{StagingProvider, StagingStore};

/// Staging store holding bodies in a map. Data is lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryStaging {
    blobs: RwLock<HashMap<String, Value>>,
}

impl InMemoryStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of staged bodies.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StagingStore for InMemoryStaging {
    fn put(&self, blob_id: &str, body: &Value) -> StagingResult<Option<BlobRef>> {
        if blob_id.is_empty() {
            return Err(StagingError::InvalidBlobId {
                id: String::new(),
                reason: "must not be empty",
            });
        }
        if is_empty_document(body) {
            return Ok(None);
        }
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(blob_id.to_string(), body.clone());
        Ok(Some(BlobRef::new(blob_id)))
    }

    fn get(&self, blob_ref: &BlobRef) -> StagingResult<Value> {
        self.blobs
            .read()
            .expect("lock poisoned")
            .get(blob_ref.as_str())
            .cloned()
            .ok_or_else(|| StagingError::Missing {
                blob: blob_ref.to_string(),
            })
    }
}

/// Hands out one shared [`InMemoryStaging`] per namespace, so separate
/// `open` calls for the same session observe the same blobs.
#[derive(Debug, Default)]
pub struct InMemoryStagingProvider {
    namespaces: Mutex<HashMap<String, Arc<InMemoryStaging>>>,
}

impl InMemoryStagingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of namespaces opened so far.
    pub fn namespace_count(&self) -> usize {
        self.namespaces.lock().expect("lock poisoned").len()
    }
}

impl StagingProvider for InMemoryStagingProvider {
    fn open(&self, namespace: &str) -> StagingResult<Arc<dyn StagingStore>> {
        let mut namespaces = self.namespaces.lock().expect("lock poisoned");
        let store = namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(InMemoryStaging::new()));
        Ok(Arc::clone(store) as Arc<dyn StagingStore>)
    }
}
