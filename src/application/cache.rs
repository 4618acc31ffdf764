use crate::domain::ports::CacheStoreRef;
use crate::domain::transaction::Transaction;
use tracing::{debug, warn};
use uuid::Uuid;

pub const KEY_BALANCE_CURRENT: &str = "balance_current";
pub const KEY_BALANCE_HISTORY: &str = "balance_history";
pub const KEY_TX_DETAIL: &str = "tx_detail";
pub const KEY_TX_HISTORY: &str = "tx_history";
pub const KEY_TX_STATS: &str = "tx_stats";

// The cache does not track which page/limit combinations exist per user, so
// list keys are swept over this fixed grid: bounded rather than complete.
const SWEEP_PAGES: std::ops::RangeInclusive<u32> = 1..=10;
const SWEEP_LIMITS: [u32; 5] = [10, 20, 25, 50, 100];

pub fn balance_current_key(user_id: Uuid) -> String {
    format!("{KEY_BALANCE_CURRENT}_{user_id}")
}

pub fn balance_history_key(user_id: Uuid, page: u32, limit: u32) -> String {
    format!("{KEY_BALANCE_HISTORY}_{user_id}_{page}_{limit}")
}

pub fn tx_detail_key(tx_id: Uuid) -> String {
    format!("{KEY_TX_DETAIL}_{tx_id}")
}

pub fn tx_history_key(user_id: Uuid, page: u32, limit: u32) -> String {
    format!("{KEY_TX_HISTORY}_{user_id}_{page}_{limit}")
}

/// Removes cached read-views made stale by a committed transaction.
///
/// Strictly a post-commit, best-effort side effect: failures are logged and
/// never reach the caller.
pub struct CacheInvalidator {
    cache: CacheStoreRef,
}

impl CacheInvalidator {
    pub fn new(cache: CacheStoreRef) -> Self {
        Self { cache }
    }

    pub async fn invalidate_after_commit(&self, tx: &Transaction) {
        self.delete(&tx_detail_key(tx.id)).await;
        self.delete(KEY_TX_STATS).await;

        for user_id in affected_users(tx) {
            self.delete(&balance_current_key(user_id)).await;
            for page in SWEEP_PAGES {
                for limit in SWEEP_LIMITS {
                    self.delete(&balance_history_key(user_id, page, limit)).await;
                    self.delete(&tx_history_key(user_id, page, limit)).await;
                }
            }
        }

        debug!(transaction = %tx.id, "caches invalidated");
    }

    async fn delete(&self, key: &str) {
        if let Err(err) = self.cache.delete(key).await {
            warn!(key, error = %err, "cache invalidation failed");
        }
    }
}

fn affected_users(tx: &Transaction) -> Vec<Uuid> {
    let mut users = Vec::with_capacity(2);
    if let Some(user_id) = tx.from_user_id {
        users.push(user_id);
    }
    if let Some(user_id) = tx.to_user_id
        && !users.contains(&user_id)
    {
        users.push(user_id);
    }
    users
}
