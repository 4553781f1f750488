//! Filesystem-backed staging.
//!
//! Bodies are laid out as one JSON file per blob id under a per-session
//! directory:
//!
//! ```text
//! <root>/<namespace>/<blob_id>.json
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use trellis_model::{is_empty_document, BlobRef};

use crate::error::{StagingError, StagingResult};
use crate::traits::{StagingProvider, StagingStore};

/// Staging store persisting bodies as JSON files in one directory.
#[derive(Debug)]
pub struct FsStaging {
    dir: PathBuf,
}

impl FsStaging {
    /// Open a store over `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> StagingResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StagingStore for FsStaging {
    fn put(&self, blob_id: &str, body: &Value) -> StagingResult<Option<BlobRef>> {
        check_component(blob_id)?;
        if is_empty_document(body) {
            return Ok(None);
        }
        let file_name = format!("{blob_id}.json");
        fs::write(self.dir.join(&file_name), serde_json::to_vec(body)?)?;
        Ok(Some(BlobRef::new(file_name)))
    }

    fn get(&self, blob_ref: &BlobRef) -> StagingResult<Value> {
        check_component(blob_ref.as_str())?;
        let bytes = match fs::read(self.dir.join(blob_ref.as_str())) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StagingError::Missing {
                    blob: blob_ref.to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Opens one [`FsStaging`] directory per session namespace under a common
/// root.
#[derive(Debug)]
pub struct FsStagingProvider {
    root: PathBuf,
}

impl FsStagingProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StagingProvider for FsStagingProvider {
    fn open(&self, namespace: &str) -> StagingResult<Arc<dyn StagingStore>> {
        check_component(namespace)?;
        Ok(Arc::new(FsStaging::open(self.root.join(namespace))?))
    }
}

/// Blob ids and namespaces become single path components; reject anything
/// that would escape the staging directory.
fn check_component(id: &str) -> StagingResult<()> {
    let reason = if id.is_empty() {
        Some("must not be empty")
    } else if id == "." || id == ".." {
        Some("must not be a relative path component")
    } else if id.chars().any(|c| std::path::is_separator(c) || c == '\0') {
        Some("must not contain path separators or NUL")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(StagingError::InvalidBlobId {
            id: id.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
