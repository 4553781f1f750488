//! The Trellis compiler: accumulation, validation, and link resolution.
//!
//! A [`Snapshot`] gathers the types, objects, and links a session submits
//! across any number of calls. Accumulation is deliberately permissive —
//! nothing is cross-checked while entities arrive, so a snapshot may pass
//! through transiently inconsistent states. All guarantees are established
//! at the end by [`Snapshot::compile`], which either returns a
//! [`ResolvedSnapshot`] safe to materialize downstream or rejects the whole
//! snapshot with the first [`CompileError`] it finds.
//!
//! Compilation runs three stages in order:
//!
//! 1. identifier validation (an extension point, nothing rejected today),
//! 2. object/type matching: every object's origin type must be a known
//!    type, builtin objects excepted,
//! 3. link resolution: every endpoint must exist, and every undefined
//!    object link is rewritten to the relation kind granted by the
//!    type-level link between its endpoints' origin types.
//!
//! # Modules
//!
//! - [`error`] — [`CompileError`]
//! - [`snapshot`] — the [`Snapshot`] builder and its accumulation ops
//! - [`compile`] — the validation stages and [`ResolvedSnapshot`]

pub mod compile;
pub mod error;
pub mod snapshot;

pub use compile::ResolvedSnapshot;
pub use error::CompileError;
pub use snapshot::Snapshot;
