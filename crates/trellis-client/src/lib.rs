//! Ingestion client for Trellis.
//!
//! [`IngestClient`] accumulates types, objects, and links locally and
//! submits them to a dispatcher in size-bounded batches over a
//! [`DispatchTransport`]. The session is opened lazily at the first
//! submission and retired by [`IngestClient::commit`].

pub mod client;
pub mod error;
pub mod transport;

pub use client::IngestClient;
pub use error::{ClientError, ClientResult};
pub use transport::{DispatchTransport, InProcessTransport, TransportError};
