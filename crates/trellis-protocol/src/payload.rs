//! The `add` payload: three optional arrays of entity specs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use trellis_model::reserved::{is_reserved_id, is_reserved_relation};

use crate::error::ProtocolError;

/// A link submission. An empty `linkType` selects the object-link path
/// (relation kind resolved at compile time); a non-empty one declares a
/// type-level link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub from: String,
    pub to: String,
    #[serde(rename = "linkType", default)]
    pub link_type: String,
}

impl LinkSpec {
    /// A type-level link declaring `relation_kind` between two types.
    pub fn between_types(
        from: impl Into<String>,
        to: impl Into<String>,
        relation_kind: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            link_type: relation_kind.into(),
        }
    }

    /// An object-to-object link with the relation kind left to resolution.
    pub fn between_objects(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            link_type: String::new(),
        }
    }
}

/// A type submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub id: String,
    #[serde(default)]
    pub body: Value,
}

impl TypeSpec {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

/// An object submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub id: String,
    #[serde(rename = "originType")]
    pub origin_type: String,
    #[serde(default)]
    pub body: Value,
}

impl ObjectSpec {
    pub fn new(id: impl Into<String>, origin_type: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            origin_type: origin_type.into(),
            body,
        }
    }
}

/// One `add` payload. All three arrays are optional on the wire; they are
/// always serialized so a batch has a stable envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityBatch {
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub types: Vec<TypeSpec>,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
}

impl EntityBatch {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.types.is_empty() && self.objects.is_empty()
    }

    /// Total number of entity specs across the three arrays.
    pub fn len(&self) -> usize {
        self.links.len() + self.types.len() + self.objects.len()
    }

    /// Boundary validation, run before entities enter a session.
    ///
    /// Created types and objects must carry a non-empty, non-reserved id,
    /// and explicit relation kinds must not collide with the synthesized
    /// vocabulary. Reserved ids stay legal as an object's origin type and
    /// as link endpoints, so callers can hang entities off the scaffold.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        for spec in &self.types {
            check_created_id("type", &spec.id)?;
        }
        for spec in &self.objects {
            check_created_id("object", &spec.id)?;
            if spec.origin_type.is_empty() {
                return Err(ProtocolError::EmptyId {
                    entity: "origin type",
                });
            }
        }
        for spec in &self.links {
            if spec.from.is_empty() || spec.to.is_empty() {
                return Err(ProtocolError::EmptyEndpoint);
            }
            if !spec.link_type.is_empty() && is_reserved_relation(&spec.link_type) {
                return Err(ProtocolError::ReservedRelation {
                    kind: spec.link_type.clone(),
                });
            }
        }
        Ok(())
    }
}

fn check_created_id(entity: &'static str, id: &str) -> Result<(), ProtocolError> {
    if id.is_empty() {
        return Err(ProtocolError::EmptyId { entity });
    }
    if is_reserved_id(id) {
        return Err(ProtocolError::ReservedId { id: id.to_string() });
    }
    Ok(())
}
