//! The entity value types: types, objects, and links.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reserved::BUILTIN_TYPE_ID;

/// Opaque handle to a staged body.
///
/// Produced by a staging store `put` and only meaningful to the store that
/// issued it. Definitions carry a `BlobRef` instead of the body itself so
/// the snapshot stays small enough to live in a durable context document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef(String);

impl BlobRef {
    /// Wrap a raw handle issued by a staging store.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a link's relation kind is explicit or still awaiting resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// The relation kind was supplied explicitly. Type-level links start
    /// out defined; object links become defined once resolved.
    Defined,
    /// An object-to-object relation whose kind must be copied from the
    /// type-level link between the endpoints' origin types.
    Undefined,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined => f.write_str("defined"),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

/// A node category definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub id: String,
    /// Staged body, when a non-empty body was submitted.
    pub staged: Option<BlobRef>,
}

impl TypeDef {
    pub fn new(id: impl Into<String>, staged: Option<BlobRef>) -> Self {
        Self {
            id: id.into(),
            staged,
        }
    }
}

/// A node instance bound to an origin type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub id: String,
    /// The type this object instantiates. Must name a known type at compile
    /// time unless it is the reserved builtin type.
    pub origin_type: String,
    /// Staged body, when a non-empty body was submitted.
    pub staged: Option<BlobRef>,
}

impl ObjectDef {
    pub fn new(
        id: impl Into<String>,
        origin_type: impl Into<String>,
        staged: Option<BlobRef>,
    ) -> Self {
        Self {
            id: id.into(),
            origin_type: origin_type.into(),
            staged,
        }
    }

    /// Builtin objects skip body staging and the auto-generated
    /// containment links.
    pub fn is_builtin(&self) -> bool {
        self.origin_type == BUILTIN_TYPE_ID
    }
}

/// Ordered `(from, to)` pair uniquely identifying a link within a snapshot.
///
/// A later submission for the same pair overwrites the earlier one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    pub from: String,
    pub to: String,
}

impl LinkKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// A relation between two ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub mode: LinkMode,
    pub from: String,
    pub to: String,
    /// The relation kind. Carries the fixed placeholder while `mode` is
    /// [`LinkMode::Undefined`].
    pub kind: String,
    /// The relation kind this link grants to object links between its
    /// endpoints' instances. Empty on everything but type-level links.
    pub object_tag: String,
}

impl Link {
    /// A link whose relation kind is already known.
    pub fn defined(
        from: impl Into<String>,
        to: impl Into<String>,
        kind: impl Into<String>,
        object_tag: impl Into<String>,
    ) -> Self {
        Self {
            mode: LinkMode::Defined,
            from: from.into(),
            to: to.into(),
            kind: kind.into(),
            object_tag: object_tag.into(),
        }
    }

    /// An object-to-object link awaiting resolution.
    pub fn undefined(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            mode: LinkMode::Undefined,
            from: from.into(),
            to: to.into(),
            kind: crate::reserved::REL_OBJECT_PLACEHOLDER.to_string(),
            object_tag: String::new(),
        }
    }

    pub fn key(&self) -> LinkKey {
        LinkKey::new(self.from.clone(), self.to.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_links_carry_the_placeholder_kind() {
        let link = Link::undefined("a", "b");
        assert_eq!(link.mode, LinkMode::Undefined);
        assert_eq!(link.kind, "obj");
        assert!(link.object_tag.is_empty());
    }

    #[test]
    fn link_key_displays_as_from_slash_to() {
        assert_eq!(LinkKey::new("a", "b").to_string(), "a/b");
    }

    #[test]
    fn link_keys_order_by_from_then_to() {
        let mut keys = vec![
            LinkKey::new("b", "a"),
            LinkKey::new("a", "z"),
            LinkKey::new("a", "b"),
        ];
        keys.sort();
        assert_eq!(keys[0], LinkKey::new("a", "b"));
        assert_eq!(keys[2], LinkKey::new("b", "a"));
    }

    #[test]
    fn builtin_objects_are_recognized() {
        assert!(ObjectDef::new("root", "builtin", None).is_builtin());
        assert!(!ObjectDef::new("alice", "Person", None).is_builtin());
    }
}
