//! Session-scoped staging stores for entity bodies.
//!
//! A session accumulates its types and objects across many `add` calls, and
//! the accumulated snapshot travels through the actor substrate and sits in
//! a durable context document between calls. Bodies would bloat both, so
//! they are staged out of band: a [`StagingStore`] keeps bodies keyed by
//! blob id, and the snapshot carries only the returned
//! [`trellis_model::BlobRef`] handles. The final push phase reads the bodies
//! back right before emitting downstream creates.
//!
//! Two backends implement the contract: [`FsStaging`] persists one JSON
//! file per body under a per-session directory, and [`InMemoryStaging`]
//! holds bodies in a map for tests and embedding.
//!
//! # Modules
//!
//! - [`error`] — [`StagingError`] and the crate result alias
//! - [`traits`] — the [`StagingStore`] and [`StagingProvider`] contracts
//! - [`fs`] — filesystem-backed staging
//! - [`memory`] — in-memory staging

pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use error::{StagingError, StagingResult};
pub use fs::{FsStaging, FsStagingProvider};
pub use memory::{InMemoryStaging, InMemoryStagingProvider};
pub use traits::{StagingProvider, StagingStore};
