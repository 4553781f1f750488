//! The in-memory snapshot a session accumulates into.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use trellis_model::reserved::{
    builtin_type, objects_container, root_object, types_container, BUILTIN_TYPE_ID, GROUP_TYPE_ID,
    NAV_OBJECT_ID, OBJECTS_CONTAINER_ID, REL_GROUP, REL_OBJECT, REL_OBJECTS, REL_TYPE, REL_TYPES,
    ROOT_ID, TYPES_CONTAINER_ID,
};
use trellis_model::{empty_document, Link, LinkKey, ObjectDef, TypeDef};
use trellis_staging::{StagingResult, StagingStore};

/// Accumulated types, objects, and links, keyed for last-write-wins
/// semantics and deterministic iteration.
///
/// The maps hold definitions only; bodies go to the staging store as they
/// arrive and the definitions keep the returned refs. Serialization
/// flattens the maps into arrays so the snapshot can sit in a durable
/// context document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SnapshotDoc", into = "SnapshotDoc")]
pub struct Snapshot {
    pub(crate) types: BTreeMap<String, TypeDef>,
    pub(crate) objects: BTreeMap<String, ObjectDef>,
    pub(crate) links: BTreeMap<LinkKey, Link>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn types(&self) -> &BTreeMap<String, TypeDef> {
        &self.types
    }

    pub fn objects(&self) -> &BTreeMap<String, ObjectDef> {
        &self.objects
    }

    pub fn links(&self) -> &BTreeMap<LinkKey, Link> {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.objects.is_empty() && self.links.is_empty()
    }

    /// Seed the scaffold every session starts from: the builtin type, the
    /// root and container nodes with their containment links, the group
    /// type with its self link, and the nav object.
    ///
    /// Runs once against a fresh snapshot, before any user entities.
    pub fn bootstrap(&mut self, staging: &dyn StagingStore) -> StagingResult<()> {
        let builtin = builtin_type();
        self.types.insert(builtin.id.clone(), builtin);

        for scaffold in [root_object(), objects_container(), types_container()] {
            self.objects.insert(scaffold.id.clone(), scaffold);
        }

        self.insert_link(Link::defined(ROOT_ID, OBJECTS_CONTAINER_ID, REL_OBJECTS, ""));
        self.insert_link(Link::defined(ROOT_ID, TYPES_CONTAINER_ID, REL_TYPES, ""));

        self.create_type(staging, GROUP_TYPE_ID, &empty_document())?;
        self.create_link_between_types(GROUP_TYPE_ID, GROUP_TYPE_ID, REL_GROUP);
        self.create_object(staging, NAV_OBJECT_ID, GROUP_TYPE_ID, &empty_document())?;

        debug!("seeded bootstrap scaffold");
        Ok(())
    }

    /// Register a type, stage its body, and link it under the types
    /// container. Registering an id again overwrites the earlier
    /// definition.
    pub fn create_type(
        &mut self,
        staging: &dyn StagingStore,
        id: &str,
        body: &Value,
    ) -> StagingResult<()> {
        let staged = staging.put(&type_blob_id(id), body)?;
        self.types.insert(id.to_string(), TypeDef::new(id, staged));
        self.insert_link(Link::defined(TYPES_CONTAINER_ID, id, REL_TYPE, ""));
        Ok(())
    }

    /// Register an object, stage its body, and synthesize its containment
    /// links. Builtin-typed objects skip staging and the links.
    pub fn create_object(
        &mut self,
        staging: &dyn StagingStore,
        id: &str,
        origin_type: &str,
        body: &Value,
    ) -> StagingResult<()> {
        if origin_type == BUILTIN_TYPE_ID {
            self.objects
                .insert(id.to_string(), ObjectDef::new(id, origin_type, None));
            return Ok(());
        }

        let staged = staging.put(&object_blob_id(id), body)?;
        self.objects
            .insert(id.to_string(), ObjectDef::new(id, origin_type, staged));

        self.insert_link(Link::defined(OBJECTS_CONTAINER_ID, id, REL_OBJECT, ""));
        self.insert_link(Link::defined(origin_type, id, REL_OBJECT, ""));
        self.insert_link(Link::defined(id, origin_type, REL_TYPE, ""));
        Ok(())
    }

    /// Register the type-level link establishing `relation_kind` between
    /// instances of `from` and `to`. A later call for the same pair wins.
    pub fn create_link_between_types(&mut self, from: &str, to: &str, relation_kind: &str) {
        self.insert_link(Link::defined(from, to, relation_kind, relation_kind));
    }

    /// Register an object-to-object link whose relation kind is deferred
    /// to compile time. A later call for the same pair wins.
    pub fn create_link_between_objects(&mut self, from: &str, to: &str) {
        self.insert_link(Link::undefined(from, to));
    }

    pub(crate) fn insert_link(&mut self, link: Link) {
        self.links.insert(link.key(), link);
    }
}

fn type_blob_id(id: &str) -> String {
    format!("type_{id}")
}

fn object_blob_id(id: &str) -> String {
    format!("obj_{id}")
}

/// Wire/durable form of a snapshot: the maps flattened to arrays.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct SnapshotDoc {
    #[serde(default)]
    types: Vec<TypeDef>,
    #[serde(default)]
    objects: Vec<ObjectDef>,
    #[serde(default)]
    links: Vec<Link>,
}

impl From<Snapshot> for SnapshotDoc {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            types: snapshot.types.into_values().collect(),
            objects: snapshot.objects.into_values().collect(),
            links: snapshot.links.into_values().collect(),
        }
    }
}

impl From<SnapshotDoc> for Snapshot {
    fn from(doc: SnapshotDoc) -> Self {
        let mut snapshot = Snapshot::default();
        for def in doc.types {
            snapshot.types.insert(def.id.clone(), def);
        }
        for def in doc.objects {
            snapshot.objects.insert(def.id.clone(), def);
        }
        for link in doc.links {
            snapshot.links.insert(link.key(), link);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trellis_model::LinkMode;
    use trellis_staging::InMemoryStaging;

    fn staging() -> InMemoryStaging {
        InMemoryStaging::new()
    }

    // -----------------------------------------------------------------
    // Accumulation
    // -----------------------------------------------------------------

    #[test]
    fn create_type_registers_definition_and_containment_link() {
        let staging = staging();
        let mut snapshot = Snapshot::new();

        snapshot
            .create_type(&staging, "Person", &json!({"schema": 1}))
            .unwrap();

        let def = &snapshot.types()["Person"];
        assert!(def.staged.is_some());
        let link = &snapshot.links()[&LinkKey::new("types", "Person")];
        assert_eq!(link.kind, "__type");
        assert_eq!(link.mode, LinkMode::Defined);
    }

    #[test]
    fn create_object_synthesizes_three_containment_links() {
        let staging = staging();
        let mut snapshot = Snapshot::new();

        snapshot
            .create_object(&staging, "alice", "Person", &json!({"age": 33}))
            .unwrap();

        assert_eq!(snapshot.objects()["alice"].origin_type, "Person");
        assert_eq!(
            snapshot.links()[&LinkKey::new("objects", "alice")].kind,
            "__object"
        );
        assert_eq!(
            snapshot.links()[&LinkKey::new("Person", "alice")].kind,
            "__object"
        );
        assert_eq!(
            snapshot.links()[&LinkKey::new("alice", "Person")].kind,
            "__type"
        );
    }

    #[test]
    fn builtin_objects_skip_staging_and_links() {
        let staging = staging();
        let mut snapshot = Snapshot::new();

        snapshot
            .create_object(&staging, "root", "builtin", &json!({"ignored": true}))
            .unwrap();

        assert!(snapshot.objects()["root"].staged.is_none());
        assert!(snapshot.links().is_empty());
        assert!(staging.is_empty());
    }

    #[test]
    fn empty_bodies_are_not_staged() {
        let staging = staging();
        let mut snapshot = Snapshot::new();

        snapshot.create_type(&staging, "Person", &json!({})).unwrap();
        snapshot
            .create_object(&staging, "alice", "Person", &Value::Null)
            .unwrap();

        assert!(snapshot.types()["Person"].staged.is_none());
        assert!(snapshot.objects()["alice"].staged.is_none());
        assert!(staging.is_empty());
    }

    #[test]
    fn later_link_for_the_same_pair_wins() {
        let mut snapshot = Snapshot::new();

        snapshot.create_link_between_types("A", "B", "first");
        snapshot.create_link_between_types("A", "B", "second");

        assert_eq!(snapshot.links().len(), 1);
        let link = &snapshot.links()[&LinkKey::new("A", "B")];
        assert_eq!(link.kind, "second");
        assert_eq!(link.object_tag, "second");
    }

    #[test]
    fn object_link_overwrites_type_link_for_the_same_pair() {
        let mut snapshot = Snapshot::new();

        snapshot.create_link_between_types("a", "b", "rel");
        snapshot.create_link_between_objects("a", "b");

        let link = &snapshot.links()[&LinkKey::new("a", "b")];
        assert_eq!(link.mode, LinkMode::Undefined);
        assert_eq!(link.kind, "obj");
    }

    // -----------------------------------------------------------------
    // Bootstrap
    // -----------------------------------------------------------------

    #[test]
    fn bootstrap_seeds_the_expected_scaffold() {
        let staging = staging();
        let mut snapshot = Snapshot::new();

        snapshot.bootstrap(&staging).unwrap();

        assert_eq!(snapshot.types().len(), 2, "builtin and group");
        assert_eq!(snapshot.objects().len(), 4, "root, containers, nav");
        assert_eq!(snapshot.links().len(), 7);

        assert_eq!(snapshot.links()[&LinkKey::new("root", "objects")].kind, "__objects");
        assert_eq!(snapshot.links()[&LinkKey::new("root", "types")].kind, "__types");
        assert_eq!(snapshot.links()[&LinkKey::new("types", "group")].kind, "__type");
        assert_eq!(snapshot.links()[&LinkKey::new("group", "group")].object_tag, "group");
        assert_eq!(snapshot.links()[&LinkKey::new("nav", "group")].kind, "__type");
        assert!(staging.is_empty(), "scaffold bodies are all empty");
    }

    #[test]
    fn bootstrap_scaffold_compiles_clean() {
        let staging = staging();
        let mut snapshot = Snapshot::new();
        snapshot.bootstrap(&staging).unwrap();

        assert!(snapshot.compile().is_ok());
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    #[test]
    fn snapshot_roundtrips_through_its_document_form() {
        let staging = staging();
        let mut snapshot = Snapshot::new();
        snapshot.bootstrap(&staging).unwrap();
        snapshot.create_type(&staging, "Person", &json!({"v": 1})).unwrap();
        snapshot
            .create_object(&staging, "alice", "Person", &json!({}))
            .unwrap();
        snapshot.create_link_between_objects("alice", "alice");

        let doc = serde_json::to_value(&snapshot).unwrap();
        let restored: Snapshot = serde_json::from_value(doc).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn missing_arrays_decode_to_an_empty_snapshot() {
        let restored: Snapshot = serde_json::from_value(json!({})).unwrap();
        assert!(restored.is_empty());
    }
}
