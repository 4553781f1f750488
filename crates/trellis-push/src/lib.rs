//! The push phase: fan a resolved snapshot out into a downstream graph
//! store through a bounded worker pool.
//!
//! Push operates on an already-validated, immutable
//! [`trellis_compiler::ResolvedSnapshot`]; it holds no session lock.
//! Creation order matters across entity kinds, since objects reference
//! types and links reference both, so the [`Pusher`] runs three successive
//! [`WorkerPool`] lifecycles (types, then objects, then links) instead of
//! ordering anything within a pool. A failed downstream create is logged
//! and counted in the [`PushReport`], never retried; the downstream store
//! is expected to tolerate idempotent re-creation.
//!
//! # Modules
//!
//! - [`error`] — [`PushError`]
//! - [`graph`] — the [`GraphStore`] contract and the recording test double
//! - [`pool`] — the bounded [`WorkerPool`]
//! - [`pusher`] — [`Pusher`], [`PushConfig`], [`PushReport`]

pub mod error;
pub mod graph;
pub mod pool;
pub mod pusher;

pub use error::PushError;
pub use graph::{GraphOp, GraphStore, RecordingGraphStore};
pub use pool::WorkerPool;
pub use pusher::{PushConfig, PushReport, Pusher};
