//! How a client reaches a dispatcher.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use trellis_session::Dispatcher;

/// A transport-level failure, flattened to text since the client cannot
/// act on the remote error's structure anyway.
#[derive(Debug, Error)]
#[error("transport: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Transport interface for a dispatcher deployment.
#[async_trait]
pub trait DispatchTransport: Send + Sync {
    /// Invoke `op` against `target` with a JSON payload.
    async fn call(&self, op: &str, target: &str, payload: Value) -> Result<Value, TransportError>;
}

/// Transport bound to a dispatcher in the same process.
pub struct InProcessTransport {
    dispatcher: Arc<Dispatcher>,
}

impl InProcessTransport {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl DispatchTransport for InProcessTransport {
    async fn call(&self, op: &str, target: &str, payload: Value) -> Result<Value, TransportError> {
        self.dispatcher
            .handle(op, target, payload)
            .await
            .map_err(TransportError::new)
    }
}
