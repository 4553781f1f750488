//! Turning a resolved snapshot into downstream creates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use trellis_compiler::ResolvedSnapshot;
use trellis_model::empty_document;
use trellis_staging::StagingStore;

use crate::graph::GraphStore;
use crate::pool::WorkerPool;

/// Worker-pool sizing for the push phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushConfig {
    /// Concurrent downstream calls per phase.
    pub workers: usize,
    /// Queued creates before submission blocks.
    pub queue_capacity: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_capacity: 64,
        }
    }
}

/// Per-kind outcome counts for one push.
///
/// Failures are creates the downstream store rejected; they are skipped,
/// not retried, and the committing caller never sees them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReport {
    pub types_attempted: usize,
    pub types_failed: usize,
    pub objects_attempted: usize,
    pub objects_failed: usize,
    pub links_attempted: usize,
    pub links_failed: usize,
}

impl PushReport {
    pub fn attempted(&self) -> usize {
        self.types_attempted + self.objects_attempted + self.links_attempted
    }

    pub fn failed(&self) -> usize {
        self.types_failed + self.objects_failed + self.links_failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

/// Materializes resolved snapshots into a [`GraphStore`].
///
/// Entity kinds are pushed as three successive pool lifecycles: first
/// types, then objects, then links, because objects reference types and
/// links reference both. Within a phase, order is unspecified.
pub struct Pusher {
    staging: Arc<dyn StagingStore>,
    graph: Arc<dyn GraphStore>,
    config: PushConfig,
}

impl Pusher {
    pub fn new(
        staging: Arc<dyn StagingStore>,
        graph: Arc<dyn GraphStore>,
        config: PushConfig,
    ) -> Self {
        Self {
            staging,
            graph,
            config,
        }
    }

    /// Push every entity in the snapshot, reading staged bodies back as
    /// they are needed. Unreadable bodies degrade to the empty document.
    pub async fn push(&self, snapshot: &ResolvedSnapshot) -> PushReport {
        let mut report = PushReport::default();

        let types = snapshot
            .types()
            .iter()
            .map(|(id, def)| (id.clone(), self.staging.get_or_empty(def.staged.as_ref())))
            .collect::<Vec<_>>();
        (report.types_attempted, report.types_failed) =
            self.create_node_phase(types, "type").await;

        let objects = snapshot
            .objects()
            .iter()
            .map(|(id, def)| (id.clone(), self.staging.get_or_empty(def.staged.as_ref())))
            .collect::<Vec<_>>();
        (report.objects_attempted, report.objects_failed) =
            self.create_node_phase(objects, "object").await;

        (report.links_attempted, report.links_failed) = self.create_link_phase(snapshot).await;

        debug!(
            attempted = report.attempted(),
            failed = report.failed(),
            "push finished"
        );
        report
    }

    /// One pool lifecycle creating nodes from `(id, body)` pairs.
    async fn create_node_phase(
        &self,
        entries: Vec<(String, Value)>,
        entity: &'static str,
    ) -> (usize, usize) {
        let attempted = entries.len();
        let failures = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(self.config.workers, self.config.queue_capacity);

        for (id, body) in entries {
            let graph = Arc::clone(&self.graph);
            let failures = Arc::clone(&failures);
            pool.submit(async move {
                if let Err(err) = graph.create_object(&id, body).await {
                    warn!(entity, id = %id, error = %err, "cannot create node");
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            })
            .await;
        }
        pool.close().await;

        (attempted, failures.load(Ordering::Relaxed))
    }

    /// One pool lifecycle creating every link. The link body carries the
    /// granted relation kind only when the link has one to grant.
    async fn create_link_phase(&self, snapshot: &ResolvedSnapshot) -> (usize, usize) {
        let attempted = snapshot.links().len();
        let failures = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(self.config.workers, self.config.queue_capacity);

        for link in snapshot.links().values() {
            let body = if link.object_tag.is_empty() {
                empty_document()
            } else {
                json!({"link_type": link.object_tag})
            };
            let graph = Arc::clone(&self.graph);
            let failures = Arc::clone(&failures);
            let link = link.clone();
            pool.submit(async move {
                if let Err(err) = graph
                    .create_link(&link.from, &link.to, &link.kind, body)
                    .await
                {
                    warn!(from = %link.from, to = %link.to, error = %err, "cannot create link");
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            })
            .await;
        }
        pool.close().await;

        (attempted, failures.load(Ordering::Relaxed))
    }
}
