use crate::domain::audit::AuditEntry;
use crate::domain::ports::AuditSinkRef;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Decouples audit appends from the ledger's critical path.
///
/// A single consumer task drains a bounded queue into the sink. `enqueue`
/// never blocks: when the queue is full the entry is dropped and logged.
/// `shutdown` closes the queue and waits for the consumer to drain what was
/// accepted, so pending writes are settled deterministically.
pub struct AuditWriter {
    queue: Mutex<Option<mpsc::Sender<AuditEntry>>>,
    consumer: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl AuditWriter {
    /// Spawns the consumer task on the current runtime.
    pub fn spawn(sink: AuditSinkRef, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(capacity);
        let handle = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                if let Err(err) = sink.append(entry).await {
                    warn!(error = %err, "audit append failed");
                }
            }
            debug!("audit writer drained");
        });

        Self {
            queue: Mutex::new(Some(tx)),
            consumer: tokio::sync::Mutex::new(Some(handle)),
        }
    }

    /// Best-effort hand-off of one entry to the consumer.
    pub fn enqueue(&self, entry: AuditEntry) {
        let Ok(guard) = self.queue.lock() else {
            return;
        };
        match guard.as_ref() {
            Some(tx) => {
                if tx.try_send(entry).is_err() {
                    warn!("audit queue full or closed, entry dropped");
                }
            }
            None => warn!("audit writer already shut down, entry dropped"),
        }
    }

    /// Idempotent; waits for already-accepted entries to reach the sink.
    pub async fn shutdown(&self) {
        let sender = match self.queue.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        drop(sender);

        if let Some(handle) = self.consumer.lock().await.take()
            && let Err(err) = handle.await
        {
            warn!(error = %err, "audit writer task panicked");
        }
    }
}
