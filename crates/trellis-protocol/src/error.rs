//! Protocol-boundary errors.

use thiserror::Error;

/// A payload rejected at the protocol boundary, before any entity reaches
/// a session snapshot.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A type or object arrived without an id.
    #[error("{entity} id must not be empty")]
    EmptyId { entity: &'static str },

    /// A link arrived with an empty endpoint.
    #[error("link endpoint must not be empty")]
    EmptyEndpoint,

    /// A caller tried to claim an id from the bootstrap scaffold.
    #[error("id '{id}' is reserved")]
    ReservedId { id: String },

    /// A caller tried to claim a synthesized relation kind.
    #[error("relation kind '{kind}' is reserved")]
    ReservedRelation { kind: String },

    /// The payload did not decode as the expected document.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
