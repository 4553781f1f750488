//! Entity model for the Trellis graph ingestion compiler.
//!
//! This crate defines the value types every other Trellis crate works with:
//! node categories ([`TypeDef`]), node instances ([`ObjectDef`]), and the
//! relations between them ([`Link`]), plus the reserved vocabulary seeded by
//! the bootstrap pass. Bodies never live in the model — a definition carries
//! at most a [`BlobRef`] pointing into the session's staging store.
//!
//! # Key Types
//!
//! - [`TypeDef`] — a node category, created once per id
//! - [`ObjectDef`] — a node instance bound to an origin type
//! - [`Link`] — a relation keyed by its ordered `(from, to)` pair
//! - [`LinkMode`] — whether a link's relation kind is explicit or pending
//!   resolution
//! - [`BlobRef`] — opaque handle to a staged body
//!
//! # Modules
//!
//! - [`document`] — opaque-document helpers (empty detection)
//! - [`entity`] — the entity value types
//! - [`reserved`] — reserved ids, relation kinds, and bootstrap constructors

pub mod document;
pub mod entity;
pub mod reserved;

pub use document::{empty_document, is_empty_document};
pub use entity::{BlobRef, Link, LinkKey, LinkMode, ObjectDef, TypeDef};
