//! The session operations and their serialized entry point.

use std::mem;
use std::sync::Arc;

use serde_json::Value;
use tokio::task;
use tracing::{debug, info, warn};

use trellis_protocol::{ops, AddReply, BeginReply, CommitReply, EntityBatch, ProtocolError};
use trellis_push::GraphStore;
use trellis_staging::{InMemoryStagingProvider, StagingProvider};

use crate::config::SessionConfig;
use crate::context::{ContextStore, InMemoryContextStore};
use crate::coordinator::{release_quietly, Coordinator};
use crate::error::{SessionError, SessionResult};
use crate::lock::{InMemoryLockService, LockService};
use crate::state::{PushRequest, SessionContext, SessionPhase};

/// Entry point for the session operations.
///
/// A dispatcher holds no session state of its own. Each mutating
/// operation loads the session's context document under a lease on the
/// session id, works on it, and stores it back, so any number of
/// dispatchers over the same substrate can serve the same sessions.
pub struct Dispatcher {
    coordinator: Arc<Coordinator>,
    contexts: Arc<dyn ContextStore>,
    locks: Arc<dyn LockService>,
    staging: Arc<dyn StagingProvider>,
}

impl Dispatcher {
    pub fn new(
        coordinator: Arc<Coordinator>,
        contexts: Arc<dyn ContextStore>,
        locks: Arc<dyn LockService>,
        staging: Arc<dyn StagingProvider>,
    ) -> Self {
        Self {
            coordinator,
            contexts,
            locks,
            staging,
        }
    }

    /// A dispatcher wired to in-process stores, pushing into `graph`.
    pub fn in_memory(graph: Arc<dyn GraphStore>, config: SessionConfig) -> Self {
        let contexts: Arc<dyn ContextStore> = Arc::new(InMemoryContextStore::new());
        let locks: Arc<dyn LockService> = Arc::new(InMemoryLockService::with_config(config.lock));
        let staging: Arc<dyn StagingProvider> = Arc::new(InMemoryStagingProvider::new());
        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&contexts),
            Arc::clone(&locks),
            Arc::clone(&staging),
            graph,
            config.push,
        ));
        Self::new(coordinator, contexts, locks, staging)
    }

    pub fn coordinator_id(&self) -> &str {
        self.coordinator.id()
    }

    /// Allocate a fresh session.
    pub async fn begin(&self) -> SessionResult<BeginReply> {
        self.coordinator.begin().await
    }

    /// Merge a batch of entities into an open session.
    pub async fn add(&self, session_id: &str, batch: &EntityBatch) -> SessionResult<AddReply> {
        batch.validate()?;
        self.guard_session_target(session_id)?;
        let lease = self.locks.acquire(session_id).await?;
        let result = self.apply(session_id, batch).await;
        release_quietly(&self.locks, lease).await;
        result
    }

    async fn apply(&self, session_id: &str, batch: &EntityBatch) -> SessionResult<AddReply> {
        let mut context = self.load_open_session(session_id).await?;
        let staging = self.staging.open(&context.namespace)?;

        for link in &batch.links {
            if link.link_type.is_empty() {
                context
                    .snapshot
                    .create_link_between_objects(&link.from, &link.to);
            } else {
                context
                    .snapshot
                    .create_link_between_types(&link.from, &link.to, &link.link_type);
            }
        }
        for spec in &batch.types {
            context
                .snapshot
                .create_type(staging.as_ref(), &spec.id, &spec.body)?;
        }
        for spec in &batch.objects {
            context.snapshot.create_object(
                staging.as_ref(),
                &spec.id,
                &spec.origin_type,
                &spec.body,
            )?;
        }

        self.contexts
            .store(session_id, serde_json::to_value(&context)?)
            .await?;
        debug!(
            session = %session_id,
            links = batch.links.len(),
            types = batch.types.len(),
            objects = batch.objects.len(),
            "batch merged"
        );
        Ok(AddReply::ok())
    }

    /// Compile the session. A clean compile hands the resolved snapshot to
    /// the coordinator's push and replies ok; a failed one replies failed
    /// with the error text and leaves the session open and untouched for
    /// correction and recommit.
    pub async fn commit(&self, session_id: &str) -> SessionResult<CommitReply> {
        self.guard_session_target(session_id)?;
        let lease = self.locks.acquire(session_id).await?;
        let result = self.run_commit(session_id).await;
        release_quietly(&self.locks, lease).await;
        result
    }

    async fn run_commit(&self, session_id: &str) -> SessionResult<CommitReply> {
        let mut context = self.load_open_session(session_id).await?;
        let resolved = match mem::take(&mut context.snapshot).compile() {
            Ok(resolved) => resolved,
            // the durable context was not touched, so the session stays open
            Err(err) => {
                warn!(session = %session_id, error = %err, "commit rejected");
                return Ok(CommitReply::failed(err.to_string()));
            }
        };

        context.phase = SessionPhase::Committed;
        self.contexts
            .store(session_id, serde_json::to_value(&context)?)
            .await?;

        let request = PushRequest {
            session_id: session_id.to_string(),
            namespace: context.namespace.clone(),
            snapshot: resolved,
        };
        let coordinator = Arc::clone(&self.coordinator);
        task::spawn(async move {
            if let Err(err) = coordinator.push(request).await {
                warn!(error = %err, "detached push failed");
            }
        });

        info!(session = %session_id, "session committed");
        Ok(CommitReply::ok())
    }

    /// Route one wire operation against `target`, replying in JSON. This
    /// is the surface a transport binds to.
    pub async fn handle(&self, op: &str, target: &str, payload: Value) -> SessionResult<Value> {
        match op {
            ops::BEGIN => {
                self.require_coordinator(ops::BEGIN, target)?;
                Ok(serde_json::to_value(self.begin().await?)?)
            }
            ops::ADD => {
                let batch: EntityBatch =
                    serde_json::from_value(payload).map_err(ProtocolError::Malformed)?;
                Ok(serde_json::to_value(self.add(target, &batch).await?)?)
            }
            ops::COMMIT => Ok(serde_json::to_value(self.commit(target).await?)?),
            ops::PUSH => {
                self.require_coordinator(ops::PUSH, target)?;
                let request: PushRequest =
                    serde_json::from_value(payload).map_err(ProtocolError::Malformed)?;
                Ok(serde_json::to_value(self.coordinator.push(request).await?)?)
            }
            other => Err(SessionError::UnknownOperation {
                op: other.to_string(),
            }),
        }
    }

    async fn load_open_session(&self, session_id: &str) -> SessionResult<SessionContext> {
        let doc = self
            .contexts
            .load(session_id)
            .await?
            .ok_or_else(|| SessionError::NoSuchSession {
                id: session_id.to_string(),
            })?;
        let context: SessionContext = serde_json::from_value(doc)?;
        if context.phase != SessionPhase::Open {
            return Err(SessionError::SessionSpent {
                id: session_id.to_string(),
                phase: context.phase,
            });
        }
        Ok(context)
    }

    // the coordinator's context is a counter, not a session
    fn guard_session_target(&self, session_id: &str) -> SessionResult<()> {
        if session_id == self.coordinator.id() {
            return Err(SessionError::NoSuchSession {
                id: session_id.to_string(),
            });
        }
        Ok(())
    }

    fn require_coordinator(&self, op: &'static str, target: &str) -> SessionResult<()> {
        if target != self.coordinator.id() {
            return Err(SessionError::NotCoordinator {
                op,
                target: target.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::{sleep, timeout};

    use trellis_protocol::{LinkSpec, ObjectSpec, Status, TypeSpec};
    use trellis_push::RecordingGraphStore;

    fn harness() -> (Dispatcher, Arc<RecordingGraphStore>) {
        let graph = Arc::new(RecordingGraphStore::new());
        let dispatcher = Dispatcher::in_memory(
            Arc::clone(&graph) as Arc<dyn GraphStore>,
            SessionConfig::default(),
        );
        (dispatcher, graph)
    }

    fn type_batch(id: &str) -> EntityBatch {
        EntityBatch {
            types: vec![TypeSpec::new(id, json!({}))],
            ..EntityBatch::default()
        }
    }

    /// The push runs detached from commit, so poll the graph for it.
    async fn wait_for(graph: &RecordingGraphStore, pred: impl Fn(&RecordingGraphStore) -> bool) {
        timeout(Duration::from_secs(5), async {
            while !pred(graph) {
                sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("push never landed downstream");
    }

    // ------------------------------------------------------------------
    // the happy path
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn a_full_session_lands_downstream() {
        let (dispatcher, graph) = harness();
        let session = dispatcher.begin().await.unwrap().id;

        let batch = EntityBatch {
            types: vec![TypeSpec::new("Person", json!({"schema": 1}))],
            ..EntityBatch::default()
        };
        assert_eq!(dispatcher.add(&session, &batch).await.unwrap().status, Status::Ok);

        let batch = EntityBatch {
            objects: vec![ObjectSpec::new("alice", "Person", json!({"age": 33}))],
            ..EntityBatch::default()
        };
        dispatcher.add(&session, &batch).await.unwrap();

        assert!(dispatcher.commit(&session).await.unwrap().is_ok());
        wait_for(&graph, |g| g.contains_object("alice")).await;

        // the scaffold went down with the user entities
        assert!(graph.contains_object("root"));
        assert!(graph.contains_object("nav"));
        assert!(graph.link("types", "Person").is_some());

        // alice hangs off the containers and her type
        assert!(graph.link("objects", "alice").is_some());
        assert_eq!(graph.link("Person", "alice").unwrap().0, "__object");
        assert_eq!(graph.link("alice", "Person").unwrap().0, "__type");

        // types land before the objects that reference them
        assert!(
            graph.object_position("Person").unwrap() < graph.object_position("alice").unwrap()
        );
    }

    #[tokio::test]
    async fn undefined_links_resolve_through_type_declarations() {
        let (dispatcher, graph) = harness();
        let session = dispatcher.begin().await.unwrap().id;

        // one batch, links first: order inside a batch must not matter
        let batch = EntityBatch {
            links: vec![
                LinkSpec::between_types("Person", "Person", "friend"),
                LinkSpec::between_objects("alice", "bob"),
            ],
            types: vec![TypeSpec::new("Person", json!({}))],
            objects: vec![
                ObjectSpec::new("alice", "Person", json!({})),
                ObjectSpec::new("bob", "Person", json!({})),
            ],
        };
        dispatcher.add(&session, &batch).await.unwrap();
        assert!(dispatcher.commit(&session).await.unwrap().is_ok());

        wait_for(&graph, |g| g.link("alice", "bob").is_some()).await;
        let (kind, body) = graph.link("alice", "bob").unwrap();
        assert_eq!(kind, "friend");
        assert_eq!(body, json!({}));

        let (kind, body) = graph.link("Person", "Person").unwrap();
        assert_eq!(kind, "friend");
        assert_eq!(body, json!({"link_type": "friend"}));
    }

    // ------------------------------------------------------------------
    // failed commits
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn a_rejected_commit_names_the_offender_and_keeps_the_session_open() {
        let (dispatcher, graph) = harness();
        let session = dispatcher.begin().await.unwrap().id;

        let batch = EntityBatch {
            objects: vec![ObjectSpec::new("bob", "Ghost", json!({}))],
            ..EntityBatch::default()
        };
        dispatcher.add(&session, &batch).await.unwrap();

        let reply = dispatcher.commit(&session).await.unwrap();
        assert_eq!(reply.status, Status::Failed);
        let reason = reply.result.unwrap();
        assert!(reason.contains("bob") && reason.contains("Ghost"), "{reason}");
        assert!(graph.ops().is_empty(), "nothing may reach the graph");

        // correct and recommit on the same session
        dispatcher.add(&session, &type_batch("Ghost")).await.unwrap();
        assert!(dispatcher.commit(&session).await.unwrap().is_ok());
        wait_for(&graph, |g| g.contains_object("bob")).await;
    }

    // ------------------------------------------------------------------
    // lifecycle guards
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn operations_on_unknown_sessions_are_rejected() {
        let (dispatcher, _) = harness();
        let err = dispatcher
            .add("beefbeef", &EntityBatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoSuchSession { .. }));

        let err = dispatcher.commit("beefbeef").await.unwrap_err();
        assert!(matches!(err, SessionError::NoSuchSession { .. }));
    }

    #[tokio::test]
    async fn the_coordinator_is_not_a_session() {
        let (dispatcher, _) = harness();
        dispatcher.begin().await.unwrap();

        let err = dispatcher
            .add(ops::COORDINATOR_ID, &type_batch("Person"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NoSuchSession { .. }));
    }

    #[tokio::test]
    async fn spent_sessions_accept_no_further_submissions() {
        let (dispatcher, _) = harness();
        let session = dispatcher.begin().await.unwrap().id;
        dispatcher.add(&session, &type_batch("Person")).await.unwrap();
        assert!(dispatcher.commit(&session).await.unwrap().is_ok());

        let err = dispatcher
            .add(&session, &type_batch("Animal"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::SessionSpent { .. }));

        let err = dispatcher.commit(&session).await.unwrap_err();
        assert!(matches!(err, SessionError::SessionSpent { .. }));
    }

    #[tokio::test]
    async fn reserved_ids_are_rejected_at_the_boundary() {
        let (dispatcher, _) = harness();
        let session = dispatcher.begin().await.unwrap().id;

        let err = dispatcher
            .add(&session, &type_batch("group"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Payload(_)));
    }

    // ------------------------------------------------------------------
    // isolation and concurrency
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn sessions_are_isolated_from_each_other() {
        let (dispatcher, _) = harness();
        let first = dispatcher.begin().await.unwrap().id;
        let second = dispatcher.begin().await.unwrap().id;
        assert_ne!(first, second);

        dispatcher.add(&first, &type_batch("A")).await.unwrap();

        // the second session cannot see the first session's type
        let spill = EntityBatch {
            objects: vec![ObjectSpec::new("a1", "A", json!({}))],
            ..EntityBatch::default()
        };
        dispatcher.add(&second, &spill).await.unwrap();
        let reply = dispatcher.commit(&second).await.unwrap();
        assert_eq!(reply.status, Status::Failed);

        assert!(dispatcher.commit(&first).await.unwrap().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_to_one_session_all_land() {
        let (dispatcher, graph) = harness();
        let dispatcher = Arc::new(dispatcher);
        let session = dispatcher.begin().await.unwrap().id;

        let mut handles = Vec::new();
        for i in 0..8 {
            let dispatcher = Arc::clone(&dispatcher);
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                dispatcher.add(&session, &type_batch(&format!("T{i}"))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(dispatcher.commit(&session).await.unwrap().is_ok());
        wait_for(&graph, |g| (0..8).all(|i| g.contains_object(&format!("T{i}")))).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_begins_never_reissue_an_id() {
        let (dispatcher, _) = harness();
        let dispatcher = Arc::new(dispatcher);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move { dispatcher.begin().await }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap().unwrap().id);
        }
        assert_eq!(ids.len(), 8);
    }

    // ------------------------------------------------------------------
    // the wire surface
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn handle_routes_and_guards_the_wire_operations() {
        let (dispatcher, _) = harness();

        let err = dispatcher
            .handle(ops::BEGIN, "elsewhere", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotCoordinator { .. }));
        let err = dispatcher
            .handle(ops::PUSH, "elsewhere", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotCoordinator { .. }));

        let reply = dispatcher
            .handle(ops::BEGIN, ops::COORDINATOR_ID, json!({}))
            .await
            .unwrap();
        let session = reply["id"].as_str().unwrap().to_string();

        let err = dispatcher
            .handle(ops::ADD, &session, json!({"types": 5}))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Payload(_)));

        let reply = dispatcher
            .handle(ops::ADD, &session, json!({"types": [{"id": "Person", "body": {}}]}))
            .await
            .unwrap();
        assert_eq!(reply, json!({"status": "ok"}));

        let reply = dispatcher
            .handle(ops::COMMIT, &session, json!({}))
            .await
            .unwrap();
        assert_eq!(reply, json!({"status": "ok"}));

        let err = dispatcher
            .handle("functions.dispatcher.rollback", &session, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownOperation { .. }));
    }
}
