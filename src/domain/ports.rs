use super::audit::AuditEntry;
use super::balance::Balance;
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// An atomic unit of work against the transactional store.
///
/// Operations stage changes and take row locks; nothing becomes visible to
/// other units until `commit`. Dropping an uncommitted unit rolls it back
/// and releases its locks.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Reads a balance row and takes an exclusive row lock on it, blocking
    /// until any competing unit releases the row. Absent rows still lock, so
    /// concurrent first-credits to the same user serialize.
    async fn locked_balance(&mut self, user_id: Uuid) -> Result<Option<Balance>>;
    async fn upsert_balance(&mut self, balance: Balance) -> Result<()>;
    /// Stages an update of an existing row. Fails with `BalanceNotFound` if
    /// the row does not exist.
    async fn update_balance(&mut self, balance: Balance) -> Result<()>;
    /// Stages a new transaction record. Fails with `DuplicateTransaction` if
    /// the id is already taken, staged or committed.
    async fn create_transaction(&mut self, tx: Transaction) -> Result<()>;
    async fn update_transaction(&mut self, tx: Transaction) -> Result<()>;
    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
    /// Non-locking point read of a balance row.
    async fn balance(&self, user_id: Uuid) -> Result<Option<Balance>>;
    /// Persists a transaction record outside any unit of work. Used to keep
    /// the `Failed` record after its unit rolled back.
    async fn record_transaction(&self, tx: Transaction) -> Result<()>;
}

/// Append-only sink for audit entries. Best-effort: callers never block on
/// or retry a failed append.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<()>;
}

/// Best-effort removal of cached read-views by exact key.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn delete(&self, key: &str) -> Result<()>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type AuditSinkRef = Arc<dyn AuditSink>;
pub type CacheStoreRef = Arc<dyn CacheStore>;
