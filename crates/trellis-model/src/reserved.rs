//! Reserved identifiers and the entities seeded by bootstrap.
//!
//! The bootstrap pass populates a fresh session with a fixed scaffold: a
//! root node, the two container nodes every type and object hangs off, the
//! self-referential `group` type, and the `nav` entry point. Caller-supplied
//! ids must not collide with this vocabulary, and caller-supplied relation
//! kinds must not collide with the kinds the compiler synthesizes.

use crate::entity::{ObjectDef, TypeDef};

/// Root node of the graph scaffold.
pub const ROOT_ID: &str = "root";
/// Container node every object is linked under.
pub const OBJECTS_CONTAINER_ID: &str = "objects";
/// Container node every type is linked under.
pub const TYPES_CONTAINER_ID: &str = "types";
/// Self-referential type establishing the `group` relation kind.
pub const GROUP_TYPE_ID: &str = "group";
/// Navigation entry-point object.
pub const NAV_OBJECT_ID: &str = "nav";
/// Origin type of the scaffold objects. Objects of this type are exempt
/// from body staging and from the auto-generated containment links.
pub const BUILTIN_TYPE_ID: &str = "builtin";

/// Relation kind of the root → objects-container link.
pub const REL_OBJECTS: &str = "__objects";
/// Relation kind of the root → types-container link.
pub const REL_TYPES: &str = "__types";
/// Relation kind of container → type and object → type links.
pub const REL_TYPE: &str = "__type";
/// Relation kind of container → object and type → object links.
pub const REL_OBJECT: &str = "__object";
/// Placeholder kind carried by object links until resolution.
pub const REL_OBJECT_PLACEHOLDER: &str = "obj";
/// Relation kind between two group-typed objects.
pub const REL_GROUP: &str = "group";

/// Every id the bootstrap scaffold claims.
pub const RESERVED_IDS: [&str; 6] = [
    ROOT_ID,
    OBJECTS_CONTAINER_ID,
    TYPES_CONTAINER_ID,
    GROUP_TYPE_ID,
    NAV_OBJECT_ID,
    BUILTIN_TYPE_ID,
];

/// Every relation kind the compiler or bootstrap claims.
pub const RESERVED_RELATIONS: [&str; 6] = [
    REL_OBJECTS,
    REL_TYPES,
    REL_TYPE,
    REL_OBJECT,
    REL_OBJECT_PLACEHOLDER,
    REL_GROUP,
];

/// Whether caller-supplied entities may use `id`.
pub fn is_reserved_id(id: &str) -> bool {
    RESERVED_IDS.contains(&id)
}

/// Whether caller-supplied links may use `kind`.
pub fn is_reserved_relation(kind: &str) -> bool {
    RESERVED_RELATIONS.contains(&kind)
}

/// The root scaffold object.
pub fn root_object() -> ObjectDef {
    ObjectDef::new(ROOT_ID, BUILTIN_TYPE_ID, None)
}

/// The container object all objects are linked under.
pub fn objects_container() -> ObjectDef {
    ObjectDef::new(OBJECTS_CONTAINER_ID, BUILTIN_TYPE_ID, None)
}

/// The container object all types are linked under.
pub fn types_container() -> ObjectDef {
    ObjectDef::new(TYPES_CONTAINER_ID, BUILTIN_TYPE_ID, None)
}

/// The builtin type itself. Registered directly, without the containment
/// link ordinary types get.
pub fn builtin_type() -> TypeDef {
    TypeDef::new(BUILTIN_TYPE_ID, None)
}
