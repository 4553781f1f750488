//! The staging store contracts.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use trellis_model::{empty_document, BlobRef};

use crate::error::StagingResult;

/// Id-addressed blob storage for entity bodies within one session.
///
/// Contract:
/// - `put` writes a body once per blob id; writing the same id again
///   overwrites it.
/// - Empty bodies (JSON `null` or `{}`) are never written: `put` returns
///   `Ok(None)` and the absent ref decodes back to the empty document.
/// - A [`BlobRef`] is only meaningful to the store that issued it.
pub trait StagingStore: Send + Sync {
    /// Stage `body` under `blob_id`. Returns `Ok(None)` for empty bodies.
    fn put(&self, blob_id: &str, body: &Value) -> StagingResult<Option<BlobRef>>;

    /// Read a staged body back.
    fn get(&self, blob_ref: &BlobRef) -> StagingResult<Value>;

    /// Read a staged body, degrading to the empty document when there is no
    /// ref or the ref cannot be read. The push phase uses this so one
    /// unreadable body does not abort a whole batch.
    fn get_or_empty(&self, blob_ref: Option<&BlobRef>) -> Value {
        match blob_ref {
            None => empty_document(),
            Some(blob_ref) => match self.get(blob_ref) {
                Ok(body) => body,
                Err(err) => {
                    warn!(blob = %blob_ref, error = %err, "staged body unreadable, substituting empty document");
                    empty_document()
                }
            },
        }
    }
}

/// Opens the staging namespace belonging to one session.
pub trait StagingProvider: Send + Sync {
    /// Open (creating if necessary) the store for `namespace`. Opening the
    /// same namespace twice yields stores over the same blobs.
    fn open(&self, namespace: &str) -> StagingResult<Arc<dyn StagingStore>>;
}
