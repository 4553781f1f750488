//! A bounded pool of workers draining a queue of async jobs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Fixed-capacity worker pool over a bounded job queue.
///
/// Contract:
/// - [`submit`](Self::submit) waits while the queue is full (backpressure,
///   no silent drop) and is a no-op after [`close`](Self::close).
/// - [`close`](Self::close) stops accepting jobs, waits for every queued
///   and in-flight job to finish, and may be called again freely.
/// - No ordering is guaranteed across workers; sequence dependent work as
///   successive pool lifecycles instead.
pub struct WorkerPool {
    queue: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks sharing a queue of `queue_capacity` jobs.
    /// Both are clamped to at least 1.
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let workers = (0..workers.max(1))
            .map(|_| {
                let rx = Arc::clone(&rx);
                tokio::spawn(async move {
                    loop {
                        // Hold the receiver only to dequeue, not while the
                        // job runs.
                        let job = { rx.lock().await.recv().await };
                        match job {
                            Some(job) => job.await,
                            None => break,
                        }
                    }
                })
            })
            .collect();

        Self {
            queue: Some(tx),
            workers,
        }
    }

    /// Queue a job, waiting for a slot while the queue is full. Does
    /// nothing once the pool is closed.
    pub async fn submit<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Some(queue) = &self.queue else {
            return;
        };
        // The send only errs when every worker is gone, which close()
        // alone arranges.
        if queue.send(Box::pin(job)).await.is_err() {
            warn!("worker pool queue closed mid-submit, job dropped");
        }
    }

    /// Stop accepting jobs and wait for the queue to drain and all
    /// in-flight jobs to finish.
    pub async fn close(&mut self) {
        let Some(queue) = self.queue.take() else {
            return;
        };
        drop(queue);
        for worker in self.workers.drain(..) {
            if worker.await.is_err() {
                warn!("push worker aborted");
            }
        }
        debug!("worker pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::time::timeout;

    #[tokio::test]
    async fn jobs_run_and_close_waits_for_them() {
        let mut pool = WorkerPool::new(4, 16);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..32 {
            let counter = Arc::clone(&counter);
            pool.submit(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }
        pool.close().await;

        assert_eq!(counter.load(Ordering::SeqCst), 32);
        assert!(pool.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn submit_blocks_while_the_queue_is_full() {
        let mut pool = WorkerPool::new(1, 1);
        let gate = Arc::new(Notify::new());
        let done = Arc::new(AtomicUsize::new(0));

        // Occupies the single worker until the gate opens.
        {
            let gate = Arc::clone(&gate);
            let done = Arc::clone(&done);
            pool.submit(async move {
                gate.notified().await;
                done.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }
        // Fills the single queue slot.
        {
            let done = Arc::clone(&done);
            pool.submit(async move {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }

        // Queue full, worker busy: the third submit must not complete.
        let done3 = Arc::clone(&done);
        let blocked = timeout(
            Duration::from_millis(250),
            pool.submit(async move {
                done3.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await;
        assert!(blocked.is_err(), "submit should block on a full queue");

        gate.notify_one();
        pool.close().await;
        // The blocked submission was abandoned with the timeout; the two
        // accepted jobs both ran.
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn submit_after_close_is_a_noop() {
        let mut pool = WorkerPool::new(2, 4);
        pool.close().await;

        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        pool.submit(async move {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        pool.close().await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn close_twice_is_idempotent() {
        let mut pool = WorkerPool::new(2, 4);
        let counter = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&counter);
        pool.submit(async move {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .await;

        pool.close().await;
        pool.close().await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn queued_jobs_finish_before_close_returns() {
        let mut pool = WorkerPool::new(1, 8);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.submit(async move {
                tokio::task::yield_now().await;
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }
        pool.close().await;

        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }
}
