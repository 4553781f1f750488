//! Tunables for the session layer.

use trellis_push::PushConfig;

use crate::lock::LockConfig;

/// Configuration shared by a dispatcher and its coordinator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub lock: LockConfig,
    pub push: PushConfig,
}
