//! Helpers for the opaque JSON documents carried by types and objects.

use serde_json::{Map, Value};

/// The empty document: `{}`.
///
/// Stands in for every body that was never submitted or never staged.
pub fn empty_document() -> Value {
    Value::Object(Map::new())
}

/// Whether a submitted body counts as empty.
///
/// Empty bodies are never staged; they decode back to [`empty_document`]
/// on read. JSON `null` and `{}` are both empty, everything else is not.
pub fn is_empty_document(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
