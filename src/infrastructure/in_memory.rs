use crate::domain::audit::AuditEntry;
use crate::domain::balance::Balance;
use crate::domain::ports::{AuditSink, CacheStore, LedgerStore, UnitOfWork};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

type Table<K, V> = Arc<RwLock<HashMap<K, V>>>;
type RowLock = Arc<Mutex<()>>;

/// A transactional in-memory store with per-user row locking.
///
/// Mirrors the semantics the engine expects from a relational store: locked
/// reads block competing units on the same row, writes stage inside a unit
/// of work and become visible atomically on commit. Ideal for tests and the
/// demo binary; production deployments plug a relational adapter into the
/// same ports.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    balances: Table<Uuid, Balance>,
    transactions: Table<Uuid, Transaction>,
    // One lock per user id, created on first touch and kept forever; absent
    // rows still lock so concurrent first-credits serialize.
    row_locks: Arc<Mutex<HashMap<Uuid, RowLock>>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn row_lock(&self, user_id: Uuid) -> RowLock {
        let mut locks = self.row_locks.lock().await;
        locks.entry(user_id).or_default().clone()
    }

    /// Point read of a stored transaction, for inspection outside the ports.
    pub async fn transaction(&self, id: Uuid) -> Option<Transaction> {
        self.transactions.read().await.get(&id).cloned()
    }

    pub async fn all_balances(&self) -> Vec<Balance> {
        self.balances.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork {
            store: self.clone(),
            row_guards: HashMap::new(),
            staged_balances: HashMap::new(),
            staged_transactions: HashMap::new(),
        }))
    }

    async fn balance(&self, user_id: Uuid) -> Result<Option<Balance>> {
        Ok(self.balances.read().await.get(&user_id).cloned())
    }

    async fn record_transaction(&self, tx: Transaction) -> Result<()> {
        self.transactions.write().await.insert(tx.id, tx);
        Ok(())
    }
}

/// One atomic unit of work. Holds an owned guard for every locked row and a
/// staging area for writes; `commit` publishes the staged writes before the
/// guards drop, `rollback` (or dropping the unit) discards them.
pub struct InMemoryUnitOfWork {
    store: InMemoryLedgerStore,
    row_guards: HashMap<Uuid, OwnedMutexGuard<()>>,
    staged_balances: HashMap<Uuid, Balance>,
    staged_transactions: HashMap<Uuid, Transaction>,
}

impl InMemoryUnitOfWork {
    async fn hold_row(&mut self, user_id: Uuid) {
        if self.row_guards.contains_key(&user_id) {
            return;
        }
        let lock = self.store.row_lock(user_id).await;
        // Blocks until the competing unit commits or rolls back.
        let guard = lock.lock_owned().await;
        self.row_guards.insert(user_id, guard);
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn locked_balance(&mut self, user_id: Uuid) -> Result<Option<Balance>> {
        self.hold_row(user_id).await;
        if let Some(staged) = self.staged_balances.get(&user_id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.store.balances.read().await.get(&user_id).cloned())
    }

    async fn upsert_balance(&mut self, balance: Balance) -> Result<()> {
        self.hold_row(balance.user_id).await;
        self.staged_balances.insert(balance.user_id, balance);
        Ok(())
    }

    async fn update_balance(&mut self, balance: Balance) -> Result<()> {
        self.hold_row(balance.user_id).await;
        if !self.staged_balances.contains_key(&balance.user_id)
            && !self.store.balances.read().await.contains_key(&balance.user_id)
        {
            return Err(LedgerError::BalanceNotFound(balance.user_id));
        }
        self.staged_balances.insert(balance.user_id, balance);
        Ok(())
    }

    async fn create_transaction(&mut self, tx: Transaction) -> Result<()> {
        if self.staged_transactions.contains_key(&tx.id)
            || self.store.transactions.read().await.contains_key(&tx.id)
        {
            return Err(LedgerError::DuplicateTransaction(tx.id));
        }
        self.staged_transactions.insert(tx.id, tx);
        Ok(())
    }

    async fn update_transaction(&mut self, tx: Transaction) -> Result<()> {
        self.staged_transactions.insert(tx.id, tx);
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        {
            let mut balances = self.store.balances.write().await;
            for (user_id, balance) in self.staged_balances.drain() {
                balances.insert(user_id, balance);
            }
        }
        {
            let mut transactions = self.store.transactions.write().await;
            for (id, tx) in self.staged_transactions.drain() {
                transactions.insert(id, tx);
            }
        }
        // Row locks release only after the writes are visible.
        self.row_guards.clear();
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.staged_balances.clear();
        self.staged_transactions.clear();
        self.row_guards.clear();
        Ok(())
    }
}

/// A thread-safe in-memory audit sink backed by an append-only `Vec`.
#[derive(Default, Clone)]
pub struct InMemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    pub async fn entries_for(&self, entity_id: Uuid) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

/// An in-memory cache keyed by string, storing opaque serialized snapshots.
#[derive(Default, Clone)]
pub struct InMemoryCache {
    entries: Table<String, Vec<u8>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: &str, value: Vec<u8>) {
        self.entries.write().await.insert(key.to_string(), value);
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
