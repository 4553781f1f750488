//! Compilation errors.
//!
//! Every variant is fatal to the compile call that raised it; nothing is
//! retried or partially recovered. The display text names the offending
//! entity so the committing caller can correct its inputs and recommit.

use thiserror::Error;

/// A validation failure raised by [`crate::Snapshot::compile`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    /// An object's origin type is not in the accumulated type set.
    #[error("object '{object}' references unknown type '{origin_type}'")]
    TypeMismatch { object: String, origin_type: String },

    /// A link endpoint matches neither a type nor an object.
    #[error("link '{link}': endpoint '{endpoint}' exists neither in types nor in objects")]
    UnknownEndpoint { link: String, endpoint: String },

    /// A link reached resolution with an empty relation kind.
    #[error("link '{link}' has no relation kind")]
    MissingKind { link: String },

    /// An undefined link joined something other than two objects.
    #[error("undefined link endpoint '{endpoint}' is not an object")]
    NotAnObject { endpoint: String },

    /// No type-level link joins an undefined link's origin-type pair.
    #[error("no type-level link for '{pair}'")]
    NoTypeLink { pair: String },

    /// The type-level link for the pair grants no relation kind.
    #[error("type-level link '{pair}' has an empty relation tag")]
    EmptyTag { pair: String },
}
