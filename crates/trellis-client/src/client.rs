//! The batching ingestion client.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};

use trellis_protocol::{
    ops, BeginReply, CommitReply, EntityBatch, LinkSpec, ObjectSpec, TypeSpec, FLUSH_LIMIT_BYTES,
};

use crate::error::{ClientError, ClientResult};
use crate::transport::DispatchTransport;

/// Accumulates entities locally and submits them in size-bounded batches.
///
/// Nothing goes over the transport until the pending batch would outgrow
/// the flush limit, [`flush`](Self::flush) is called, or the session is
/// committed. The session itself is allocated lazily at the first
/// submission, so a client that never accumulates anything never talks
/// to the dispatcher.
pub struct IngestClient {
    transport: Arc<dyn DispatchTransport>,
    session: Option<String>,
    batch: EntityBatch,
    /// Serialized size of the pending batch, tracked entity by entity.
    pending_bytes: usize,
    overhead: usize,
    limit: usize,
}

impl IngestClient {
    pub fn new(transport: Arc<dyn DispatchTransport>) -> Self {
        Self::with_limit(transport, FLUSH_LIMIT_BYTES)
    }

    /// A client with a custom flush threshold, for tests and constrained
    /// transports.
    pub fn with_limit(transport: Arc<dyn DispatchTransport>, limit: usize) -> Self {
        let overhead = empty_batch_overhead();
        Self {
            transport,
            session: None,
            batch: EntityBatch::default(),
            pending_bytes: overhead,
            overhead,
            limit,
        }
    }

    /// The session this client is feeding, once one has been allocated.
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub async fn add_type(&mut self, id: &str, body: Value) -> ClientResult<()> {
        let spec = TypeSpec::new(id, body);
        let size = serde_json::to_vec(&spec)?.len();
        self.make_room(size, self.batch.types.len()).await?;
        self.pending_bytes += cost(self.batch.types.len(), size);
        self.batch.types.push(spec);
        Ok(())
    }

    pub async fn add_object(&mut self, id: &str, origin_type: &str, body: Value) -> ClientResult<()> {
        let spec = ObjectSpec::new(id, origin_type, body);
        let size = serde_json::to_vec(&spec)?.len();
        self.make_room(size, self.batch.objects.len()).await?;
        self.pending_bytes += cost(self.batch.objects.len(), size);
        self.batch.objects.push(spec);
        Ok(())
    }

    pub async fn add_link_between_types(
        &mut self,
        from: &str,
        to: &str,
        relation_kind: &str,
    ) -> ClientResult<()> {
        self.add_link(LinkSpec::between_types(from, to, relation_kind))
            .await
    }

    pub async fn add_link_between_objects(&mut self, from: &str, to: &str) -> ClientResult<()> {
        self.add_link(LinkSpec::between_objects(from, to)).await
    }

    async fn add_link(&mut self, spec: LinkSpec) -> ClientResult<()> {
        let size = serde_json::to_vec(&spec)?.len();
        self.make_room(size, self.batch.links.len()).await?;
        self.pending_bytes += cost(self.batch.links.len(), size);
        self.batch.links.push(spec);
        Ok(())
    }

    /// Flush first when an entity of `size` bytes would push the pending
    /// batch over the limit. An entity too large for even a fresh batch is
    /// refused outright.
    async fn make_room(&mut self, size: usize, occupied: usize) -> ClientResult<()> {
        if self.overhead + size > self.limit {
            return Err(ClientError::EntryTooLarge {
                bytes: size,
                limit: self.limit,
            });
        }
        if self.pending_bytes + cost(occupied, size) > self.limit {
            self.flush().await?;
        }
        Ok(())
    }

    /// Submit the pending batch, allocating the session on first use.
    /// Empty batches are not submitted.
    pub async fn flush(&mut self) -> ClientResult<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let session = self.session_id().await?;
        let payload = serde_json::to_value(&self.batch)?;
        let entities = self.batch.len();
        // handler failures come back through the transport
        self.transport.call(ops::ADD, &session, payload).await?;
        debug!(session = %session, entities, bytes = self.pending_bytes, "batch submitted");
        self.batch = EntityBatch::default();
        self.pending_bytes = self.overhead;
        Ok(())
    }

    /// Flush the remainder and commit the session.
    ///
    /// A clean commit forgets the session, so the next submission starts a
    /// fresh one. A rejected commit surfaces the dispatcher's reason and
    /// keeps the session, leaving room to submit corrections and retry.
    pub async fn commit(&mut self) -> ClientResult<()> {
        self.flush().await?;
        let session = self.session_id().await?;
        let reply = self.transport.call(ops::COMMIT, &session, json!({})).await?;
        let reply: CommitReply = serde_json::from_value(reply)?;
        if !reply.is_ok() {
            return Err(ClientError::CommitFailed {
                reason: reply.result.unwrap_or_default(),
            });
        }
        self.session = None;
        info!(session = %session, "session committed");
        Ok(())
    }

    async fn session_id(&mut self) -> ClientResult<String> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }
        let reply = self
            .transport
            .call(ops::BEGIN, ops::COORDINATOR_ID, json!({}))
            .await?;
        let reply: BeginReply = serde_json::from_value(reply)?;
        if reply.id.is_empty() {
            return Err(ClientError::EmptySessionId);
        }
        info!(session = %reply.id, "session allocated");
        self.session = Some(reply.id.clone());
        Ok(reply.id)
    }
}

/// What an entity adds to the batch: its own bytes, plus the separator
/// when its array already has an element.
fn cost(occupied: usize, size: usize) -> usize {
    if occupied == 0 {
        size
    } else {
        size + 1
    }
}

/// What an empty batch costs on the wire before its first entity.
fn empty_batch_overhead() -> usize {
    serde_json::to_vec(&EntityBatch::default())
        .unwrap_or_default()
        .len()
}
