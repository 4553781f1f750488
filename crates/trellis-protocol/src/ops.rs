//! Operation names and wire constants.

/// Allocate a session. Coordinator-only.
pub const BEGIN: &str = "functions.dispatcher.begin";
/// Merge a batch of entities into a session.
pub const ADD: &str = "functions.dispatcher.add";
/// Compile a session and hand the result to the coordinator.
pub const COMMIT: &str = "functions.dispatcher.commit";
/// Materialize a resolved snapshot downstream. Coordinator-only.
pub const PUSH: &str = "functions.dispatcher.push";

/// The singleton coordinator's target id.
pub const COORDINATOR_ID: &str = "main_dispatcher";

/// Ceiling on the serialized size of any one `add` payload. Accumulation
/// paths flush before an entity would push the pending batch over this.
pub const FLUSH_LIMIT_BYTES: usize = 1 << 14;
