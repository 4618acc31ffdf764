use crate::application::audit::AuditWriter;
use crate::application::cache::CacheInvalidator;
use crate::application::engine::LedgerEngine;
use crate::application::pool::{JobProcessor, PoolStats, WorkerPool};
use crate::domain::job::{Job, JobResult};
use crate::domain::ports::{AuditSinkRef, CacheStoreRef, LedgerStoreRef};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct LedgerConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub audit_queue_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            queue_capacity: 100,
            audit_queue_capacity: 256,
        }
    }
}

/// Runs the engine for one job and, only after its unit of work committed,
/// hands the audit entries to the writer and invalidates stale cache keys.
struct JobExecutor {
    engine: LedgerEngine,
    audit: Arc<AuditWriter>,
    invalidator: CacheInvalidator,
}

#[async_trait]
impl JobProcessor for JobExecutor {
    async fn process(&self, job: &Job) -> JobResult {
        let outcome = self.engine.execute(job).await?;

        for entry in outcome.audit_entries {
            self.audit.enqueue(entry);
        }
        self.invalidator
            .invalidate_after_commit(&outcome.transaction)
            .await;

        Ok(outcome.transaction)
    }
}

/// Composition root for the ledger: wires the worker pool to the engine and
/// the post-commit side effects.
///
/// An explicit, constructed object with a defined lifecycle; callers receive
/// and pass the handle rather than reaching for ambient global state.
pub struct LedgerService {
    pool: WorkerPool,
    audit: Arc<AuditWriter>,
}

impl LedgerService {
    /// Builds the service on the current runtime. Call `start` before
    /// submitting jobs.
    pub fn new(
        store: LedgerStoreRef,
        audit_sink: AuditSinkRef,
        cache: CacheStoreRef,
        config: LedgerConfig,
    ) -> Self {
        let audit = Arc::new(AuditWriter::spawn(audit_sink, config.audit_queue_capacity));
        let executor = Arc::new(JobExecutor {
            engine: LedgerEngine::new(store),
            audit: audit.clone(),
            invalidator: CacheInvalidator::new(cache),
        });

        Self {
            pool: WorkerPool::new(config.workers, config.queue_capacity, executor),
            audit,
        }
    }

    pub async fn start(&self) {
        self.pool.start().await;
    }

    /// Stops the pool, then drains the audit writer so every entry accepted
    /// before shutdown reaches the sink.
    pub async fn stop(&self) {
        self.pool.stop().await;
        self.audit.shutdown().await;
    }

    /// Fire-and-forget submission with queue backpressure.
    pub async fn submit(&self, job: Job) -> Result<()> {
        job.validate()?;
        self.pool.submit(job).await
    }

    /// Submits and waits for this job's result.
    pub async fn submit_and_wait(&self, job: Job) -> JobResult {
        job.validate()?;
        self.pool.submit_and_wait(job).await
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn queue_len(&self) -> usize {
        self.pool.queue_len()
    }
}
