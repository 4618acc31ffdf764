use ledgerd::application::service::{LedgerConfig, LedgerService};
use ledgerd::domain::balance::Amount;
use ledgerd::domain::job::Job;
use ledgerd::domain::ports::LedgerStore;
use ledgerd::infrastructure::in_memory::{InMemoryAuditSink, InMemoryCache, InMemoryLedgerStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

pub struct TestLedger {
    pub service: LedgerService,
    pub store: Arc<InMemoryLedgerStore>,
    pub audit: Arc<InMemoryAuditSink>,
    pub cache: Arc<InMemoryCache>,
}

pub async fn started_ledger() -> TestLedger {
    started_ledger_with(LedgerConfig::default()).await
}

pub async fn started_ledger_with(config: LedgerConfig) -> TestLedger {
    let store = Arc::new(InMemoryLedgerStore::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let cache = Arc::new(InMemoryCache::new());
    let service = LedgerService::new(store.clone(), audit.clone(), cache.clone(), config);
    service.start().await;

    TestLedger {
        service,
        store,
        audit,
        cache,
    }
}

pub fn amount(value: Decimal) -> Amount {
    value.try_into().expect("positive amount")
}

impl TestLedger {
    /// Seeds a balance through a normal deposit job.
    pub async fn seed(&self, user_id: Uuid, value: Decimal) {
        self.service
            .submit_and_wait(Job::deposit(user_id, amount(value)))
            .await
            .expect("seed deposit should succeed");
    }

    pub async fn balance_of(&self, user_id: Uuid) -> Decimal {
        self.store
            .balance(user_id)
            .await
            .expect("store read")
            .map(|b| b.amount)
            .unwrap_or(Decimal::ZERO)
    }
}
