//! Wire documents for the Trellis session protocol.
//!
//! Everything that crosses the actor substrate is typed here: the
//! [`EntityBatch`] callers accumulate into and send with `add`, and the
//! replies each operation returns. Payloads are validated at the boundary
//! ([`EntityBatch::validate`]) before any entity reaches a session
//! snapshot, so reserved vocabulary cannot be claimed remotely.
//!
//! Field names follow the external wire format (`linkType`, `originType`),
//! not Rust convention.
//!
//! # Modules
//!
//! - [`error`] — [`ProtocolError`]
//! - [`ops`] — operation names and wire constants
//! - [`payload`] — [`EntityBatch`] and the per-entity specs
//! - [`reply`] — [`BeginReply`], [`AddReply`], [`CommitReply`], [`Status`]

pub mod error;
pub mod ops;
pub mod payload;
pub mod reply;

pub use error::ProtocolError;
pub use ops::FLUSH_LIMIT_BYTES;
pub use payload::{EntityBatch, LinkSpec, ObjectSpec, TypeSpec};
pub use reply::{AddReply, BeginReply, CommitReply, Status};
