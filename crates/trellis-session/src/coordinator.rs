//! The singleton coordinator: session allocation and the push phase.

use std::sync::Arc;

use tracing::{info, warn};

use trellis_compiler::Snapshot;
use trellis_protocol::{ops, BeginReply};
use trellis_push::{GraphStore, PushConfig, PushReport, Pusher};
use trellis_staging::StagingProvider;

use crate::context::ContextStore;
use crate::error::{SessionError, SessionResult};
use crate::lock::{Lease, LockService};
use crate::state::{CoordinatorContext, PushRequest, SessionContext, SessionPhase};

/// The one target allowed to allocate sessions and push snapshots.
///
/// Session ids derive from a counter in the coordinator's own context
/// document, bumped under the coordinator's lock, so concurrent begins
/// never reissue an id even across dispatcher restarts.
pub struct Coordinator {
    id: String,
    contexts: Arc<dyn ContextStore>,
    locks: Arc<dyn LockService>,
    staging: Arc<dyn StagingProvider>,
    graph: Arc<dyn GraphStore>,
    push_config: PushConfig,
}

impl Coordinator {
    pub fn new(
        contexts: Arc<dyn ContextStore>,
        locks: Arc<dyn LockService>,
        staging: Arc<dyn StagingProvider>,
        graph: Arc<dyn GraphStore>,
        push_config: PushConfig,
    ) -> Self {
        Self {
            id: ops::COORDINATOR_ID.to_string(),
            contexts,
            locks,
            staging,
            graph,
            push_config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Allocate a session: bump the durable counter, derive the id, seed
    /// the scaffold, and persist the open session context.
    pub async fn begin(&self) -> SessionResult<BeginReply> {
        let lease = self.locks.acquire(&self.id).await?;
        let result = self.allocate_session().await;
        release_quietly(&self.locks, lease).await;
        result
    }

    async fn allocate_session(&self) -> SessionResult<BeginReply> {
        let mut counter = match self.contexts.load(&self.id).await? {
            Some(doc) => serde_json::from_value::<CoordinatorContext>(doc)?,
            None => CoordinatorContext::default(),
        };
        counter.nonce += 1;
        self.contexts
            .store(&self.id, serde_json::to_value(counter)?)
            .await?;

        let session_id = derive_session_id(&self.id, counter.nonce);
        let staging = self.staging.open(&session_id)?;
        let mut snapshot = Snapshot::new();
        snapshot.bootstrap(staging.as_ref())?;

        let context = SessionContext::open(&session_id, &session_id, snapshot);
        self.contexts
            .store(&session_id, serde_json::to_value(&context)?)
            .await?;

        info!(session = %session_id, nonce = counter.nonce, "session opened");
        Ok(BeginReply { id: session_id })
    }

    /// Materialize a committed session downstream and mark it done.
    ///
    /// Push is best effort: entities the downstream store rejects are
    /// counted in the report and skipped, never rolled back.
    pub async fn push(&self, request: PushRequest) -> SessionResult<PushReport> {
        let staging = self.staging.open(&request.namespace)?;
        let pusher = Pusher::new(staging, Arc::clone(&self.graph), self.push_config);
        let report = pusher.push(&request.snapshot).await;
        if report.is_clean() {
            info!(
                session = %request.session_id,
                attempted = report.attempted(),
                "pushed session downstream"
            );
        } else {
            warn!(
                session = %request.session_id,
                attempted = report.attempted(),
                failed = report.failed(),
                "pushed session downstream with failures"
            );
        }

        // the session is already spent, so a failure here is only logged
        if let Err(err) = self.finish_session(&request.session_id).await {
            warn!(session = %request.session_id, error = %err, "pushed session could not be marked done");
        }
        Ok(report)
    }

    async fn finish_session(&self, session_id: &str) -> SessionResult<()> {
        let doc = self
            .contexts
            .load(session_id)
            .await?
            .ok_or_else(|| SessionError::NoSuchSession {
                id: session_id.to_string(),
            })?;
        let mut context: SessionContext = serde_json::from_value(doc)?;
        context.phase = SessionPhase::Done;
        self.contexts
            .store(session_id, serde_json::to_value(&context)?)
            .await?;
        Ok(())
    }
}

/// Session ids hash the coordinator id with the counter value: stable
/// length, no collisions, no dependence on host randomness.
fn derive_session_id(coordinator: &str, nonce: u64) -> String {
    hex::encode(blake3::hash(format!("{coordinator}{nonce}").as_bytes()).as_bytes())
}

/// Release a lease on a best-effort path, logging instead of failing.
pub(crate) async fn release_quietly(locks: &Arc<dyn LockService>, lease: Lease) {
    let key = lease.key().to_string();
    if let Err(err) = locks.release(lease).await {
        warn!(key = %key, error = %err, "lease release failed");
    }
}
