//! Push-phase errors.

use thiserror::Error;

/// A downstream create rejected by the graph store.
///
/// Push never propagates these; they are logged, counted in the report,
/// and the rest of the batch proceeds.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PushError {
    #[error("downstream create failed: {reason}")]
    Downstream { reason: String },
}

impl PushError {
    pub fn downstream(reason: impl Into<String>) -> Self {
        Self::Downstream {
            reason: reason.into(),
        }
    }
}
