//! Session lifecycle for the Trellis ingestion pipeline.
//!
//! A session is begun by the coordinator, accumulates entity batches
//! under a per-session lease, compiles on commit, and is pushed
//! downstream once. All session state lives in a durable context store,
//! so dispatchers stay stateless and interchangeable.
//!
//! # Key Types
//! - [`Dispatcher`]: the session operations and their serialized entry
//!   point [`Dispatcher::handle`].
//! - [`Coordinator`]: the singleton that allocates sessions and pushes
//!   committed snapshots.
//! - [`LockService`] and [`ContextStore`]: the substrate contracts, each
//!   with an in-memory implementation for tests and embedding.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod lock;
pub mod state;

pub use config::SessionConfig;
pub use context::{ContextStore, InMemoryContextStore};
pub use coordinator::Coordinator;
pub use dispatcher::Dispatcher;
pub use error::{ContextError, LockError, SessionError, SessionResult};
pub use lock::{InMemoryLockService, Lease, LockConfig, LockService};
pub use state::{CoordinatorContext, PushRequest, SessionContext, SessionPhase};
