use crate::domain::job::{Job, JobResult};
use crate::domain::transaction::TransactionKind;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tokio::sync::{Mutex, RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Executes one job to completion. The pool calls this synchronously from a
/// worker and records stats from the returned outcome.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    async fn process(&self, job: &Job) -> JobResult;
}

/// Point-in-time snapshot of the pool's cumulative counters. Amounts are in
/// integer minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub total_processed: u64,
    pub total_successful: u64,
    pub total_failed: u64,
    pub total_credited: i64,
    pub total_debited: i64,
    pub total_transferred: i64,
}

#[derive(Default)]
struct Counters {
    processed: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    credited: AtomicI64,
    debited: AtomicI64,
    transferred: AtomicI64,
}

struct Envelope {
    job: Job,
    reply: Option<oneshot::Sender<JobResult>>,
}

/// A bounded FIFO job queue drained by a fixed set of concurrent workers.
///
/// `submit` applies backpressure when the queue is full; `submit_and_wait`
/// additionally parks the caller on a single-slot reply channel until its
/// worker delivers exactly one result. Jobs are dequeued FIFO, but completion
/// order across workers is not guaranteed; per-account ordering comes from
/// store row locks, not from the pool.
pub struct WorkerPool {
    worker_count: usize,
    queue_capacity: usize,
    processor: Arc<dyn JobProcessor>,
    counters: Arc<Counters>,
    queue_depth: Arc<AtomicUsize>,
    queue: RwLock<Option<mpsc::Sender<Envelope>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(
        worker_count: usize,
        queue_capacity: usize,
        processor: Arc<dyn JobProcessor>,
    ) -> Self {
        Self {
            worker_count,
            queue_capacity,
            processor,
            counters: Arc::new(Counters::default()),
            queue_depth: Arc::new(AtomicUsize::new(0)),
            queue: RwLock::new(None),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the worker loops. No-op if already running.
    pub async fn start(&self) {
        let mut queue = self.queue.write().await;
        if queue.is_some() {
            debug!("worker pool already running");
            return;
        }

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = self.workers.lock().await;
        for id in 0..self.worker_count {
            workers.push(tokio::spawn(worker_loop(
                id,
                rx.clone(),
                self.processor.clone(),
                self.counters.clone(),
                self.queue_depth.clone(),
            )));
        }
        *queue = Some(tx);

        info!(
            workers = self.worker_count,
            capacity = self.queue_capacity,
            "worker pool started"
        );
    }

    /// Enqueues without waiting for completion. Blocks while the queue is
    /// full.
    pub async fn submit(&self, job: Job) -> Result<()> {
        self.dispatch(job, None).await
    }

    /// Enqueues and blocks the caller until the assigned worker delivers the
    /// job's result. A caller that stops waiting only cancels the wait; the
    /// job still runs to completion.
    pub async fn submit_and_wait(&self, job: Job) -> JobResult {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(job, Some(reply_tx)).await?;
        reply_rx.await.map_err(|_| LedgerError::ResultChannelClosed)?
    }

    async fn dispatch(&self, job: Job, reply: Option<oneshot::Sender<JobResult>>) -> Result<()> {
        let sender = self
            .queue
            .read()
            .await
            .clone()
            .ok_or(LedgerError::PoolClosed)?;

        // Counted before the send so a worker can never observe the envelope
        // ahead of the increment.
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
        if sender.send(Envelope { job, reply }).await.is_err() {
            self.queue_depth.fetch_sub(1, Ordering::Relaxed);
            return Err(LedgerError::PoolClosed);
        }
        Ok(())
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_processed: self.counters.processed.load(Ordering::Relaxed),
            total_successful: self.counters.successful.load(Ordering::Relaxed),
            total_failed: self.counters.failed.load(Ordering::Relaxed),
            total_credited: self.counters.credited.load(Ordering::Relaxed),
            total_debited: self.counters.debited.load(Ordering::Relaxed),
            total_transferred: self.counters.transferred.load(Ordering::Relaxed),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }

    /// Closes the queue and waits for all in-flight workers to drain. No-op
    /// if already stopped. The pool may be started again afterwards with a
    /// fresh queue.
    pub async fn stop(&self) {
        let sender = self.queue.write().await.take();
        if sender.is_none() {
            debug!("worker pool already stopped");
            return;
        }
        drop(sender);

        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(err) = handle.await {
                warn!(error = %err, "worker task panicked");
            }
        }
        info!("worker pool stopped");
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Envelope>>>,
    processor: Arc<dyn JobProcessor>,
    counters: Arc<Counters>,
    queue_depth: Arc<AtomicUsize>,
) {
    debug!(worker = id, "worker started");
    loop {
        // Hold the receiver lock only while dequeuing so other workers can
        // pull jobs while this one processes.
        let envelope = { queue.lock().await.recv().await };
        let Some(Envelope { job, reply }) = envelope else {
            break;
        };
        queue_depth.fetch_sub(1, Ordering::Relaxed);

        let started = Instant::now();
        let result = processor.process(&job).await;

        counters.processed.fetch_add(1, Ordering::Relaxed);
        match &result {
            Ok(_) => {
                counters.successful.fetch_add(1, Ordering::Relaxed);
                let units = job.amount.minor_units();
                let amount_counter = match job.kind {
                    TransactionKind::Deposit => &counters.credited,
                    TransactionKind::Withdraw => &counters.debited,
                    TransactionKind::Transfer => &counters.transferred,
                };
                amount_counter.fetch_add(units, Ordering::Relaxed);
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                debug!(worker = id, job = %job.id, error = %err, "job failed");
            }
        }

        if let Some(reply) = reply
            && reply.send(result).is_err()
        {
            debug!(worker = id, job = %job.id, "caller stopped waiting for result");
        }

        debug!(worker = id, job = %job.id, elapsed = ?started.elapsed(), "job processed");
    }
    debug!(worker = id, "worker exited");
}
