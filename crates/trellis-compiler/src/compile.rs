//! The validation stages and the resolved output type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use trellis_model::{Link, LinkKey, LinkMode, ObjectDef, TypeDef};

use crate::error::CompileError;
use crate::snapshot::Snapshot;

impl Snapshot {
    /// Validate the accumulated snapshot and resolve every undefined link.
    ///
    /// Stages run in order: identifier validation, object/type matching,
    /// link resolution. The first violation aborts the compile. On success
    /// the snapshot is consumed into a [`ResolvedSnapshot`], so only
    /// validated entity sets reach the push phase.
    pub fn compile(mut self) -> Result<ResolvedSnapshot, CompileError> {
        self.validate_identifiers()?;
        self.check_object_types()?;
        self.resolve_links()?;
        Ok(ResolvedSnapshot(self))
    }

    /// Syntax checks over accumulated ids. Extension point; nothing is
    /// rejected today.
    fn validate_identifiers(&self) -> Result<(), CompileError> {
        Ok(())
    }

    /// Every object's origin type must name an accumulated type. Builtin
    /// objects are exempt.
    fn check_object_types(&self) -> Result<(), CompileError> {
        for object in self.objects.values() {
            if object.is_builtin() {
                continue;
            }
            if !self.types.contains_key(&object.origin_type) {
                return Err(CompileError::TypeMismatch {
                    object: object.id.clone(),
                    origin_type: object.origin_type.clone(),
                });
            }
        }
        Ok(())
    }

    /// Check every link's endpoints and rewrite undefined links to the
    /// relation kind granted by their origin-type pair.
    ///
    /// Rewrites keep the object ids as endpoints; only the kind changes.
    /// They are collected first and applied after the scan, so resolution
    /// works off the links as accumulated, not off earlier rewrites.
    fn resolve_links(&mut self) -> Result<(), CompileError> {
        let mut resolved = Vec::new();

        for (key, link) in &self.links {
            for endpoint in [&link.from, &link.to] {
                if !self.types.contains_key(endpoint.as_str())
                    && !self.objects.contains_key(endpoint.as_str())
                {
                    return Err(CompileError::UnknownEndpoint {
                        link: key.to_string(),
                        endpoint: endpoint.to_string(),
                    });
                }
            }

            if link.kind.is_empty() {
                return Err(CompileError::MissingKind {
                    link: key.to_string(),
                });
            }

            if link.mode == LinkMode::Defined {
                continue;
            }

            let pair = self.origin_pair(link)?;
            let type_link = self
                .links
                .get(&pair)
                .ok_or_else(|| CompileError::NoTypeLink {
                    pair: pair.to_string(),
                })?;
            if type_link.object_tag.is_empty() {
                return Err(CompileError::EmptyTag {
                    pair: pair.to_string(),
                });
            }

            resolved.push((
                key.clone(),
                Link::defined(
                    link.from.clone(),
                    link.to.clone(),
                    type_link.object_tag.clone(),
                    "",
                ),
            ));
        }

        for (key, link) in resolved {
            self.links.insert(key, link);
        }
        Ok(())
    }

    /// The `(originType(from), originType(to))` lookup key for an
    /// undefined link. Both endpoints must be objects.
    fn origin_pair(&self, link: &Link) -> Result<LinkKey, CompileError> {
        let from = self
            .objects
            .get(&link.from)
            .ok_or_else(|| CompileError::NotAnObject {
                endpoint: link.from.clone(),
            })?;
        let to = self
            .objects
            .get(&link.to)
            .ok_or_else(|| CompileError::NotAnObject {
                endpoint: link.to.clone(),
            })?;
        Ok(LinkKey::new(
            from.origin_type.clone(),
            to.origin_type.clone(),
        ))
    }
}

/// A snapshot that passed compilation: every object matches a type and
/// every link carries a definite relation kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedSnapshot(Snapshot);

impl ResolvedSnapshot {
    pub fn types(&self) -> &BTreeMap<String, TypeDef> {
        self.0.types()
    }

    pub fn objects(&self) -> &BTreeMap<String, ObjectDef> {
        self.0.objects()
    }

    pub fn links(&self) -> &BTreeMap<LinkKey, Link> {
        self.0.links()
    }
}
