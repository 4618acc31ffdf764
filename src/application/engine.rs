use crate::domain::audit::{AuditAction, AuditEntry, BalanceChange};
use crate::domain::balance::Balance;
use crate::domain::job::Job;
use crate::domain::ports::{LedgerStoreRef, UnitOfWork};
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

/// What a committed job leaves behind: the finalized transaction plus the
/// audit entries to emit for it. Entries are returned rather than written
/// here so the caller can emit them strictly after the commit.
#[derive(Debug)]
pub struct CommitOutcome {
    pub transaction: Transaction,
    pub audit_entries: Vec<AuditEntry>,
}

/// The deposit/withdraw/transfer algorithms and their locking discipline.
///
/// `LedgerEngine` is stateless between calls; every job executes inside a
/// single atomic unit of work spanning create-transaction, balance
/// mutation(s) and finalize-transaction. Any failure aborts the whole unit,
/// leaving prior state unchanged.
pub struct LedgerEngine {
    store: LedgerStoreRef,
}

impl LedgerEngine {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    /// Executes one job to a terminal transaction status.
    ///
    /// On a failure after the `Pending` record was created, the unit rolls
    /// back and the transaction is re-recorded as `Failed` outside it, so the
    /// failure stays observable without keeping any balance effect.
    pub async fn execute(&self, job: &Job) -> Result<CommitOutcome> {
        job.validate()?;

        let mut tx = Transaction::new(
            job.id,
            job.kind,
            job.from_user_id,
            job.to_user_id,
            job.amount,
        );

        let mut uow = self.store.begin().await?;
        // A duplicate job id fails here and surfaces directly; the unit is
        // dropped and nothing was staged yet.
        uow.create_transaction(tx.clone()).await?;

        let applied = match job.kind {
            TransactionKind::Deposit => self.apply_deposit(uow.as_mut(), &tx).await,
            TransactionKind::Withdraw => self.apply_withdraw(uow.as_mut(), &tx).await,
            TransactionKind::Transfer => self.apply_transfer(uow.as_mut(), &tx).await,
        };

        match applied {
            Ok(audit_entries) => {
                tx.complete()?;
                uow.update_transaction(tx.clone()).await?;
                uow.commit().await?;
                Ok(CommitOutcome {
                    transaction: tx,
                    audit_entries,
                })
            }
            Err(err) => {
                uow.rollback().await?;
                tx.fail()?;
                if let Err(record_err) = self.store.record_transaction(tx).await {
                    warn!(transaction = %job.id, error = %record_err,
                        "could not record failed transaction");
                }
                Err(err)
            }
        }
    }

    async fn apply_deposit(
        &self,
        uow: &mut dyn UnitOfWork,
        tx: &Transaction,
    ) -> Result<Vec<AuditEntry>> {
        let to = tx
            .to_user_id
            .ok_or_else(|| LedgerError::InvalidJob("deposit requires to_user_id".to_string()))?;

        let previous = uow.locked_balance(to).await?;
        let previous_amount = previous
            .as_ref()
            .map(|b| b.amount)
            .unwrap_or(Decimal::ZERO);

        let mut balance = previous.unwrap_or_else(|| Balance::new(to));
        balance.credit(tx.amount);
        let new_amount = balance.amount;
        uow.upsert_balance(balance).await?;

        Ok(vec![AuditEntry::balance_change(
            to,
            AuditAction::Deposit,
            change(previous_amount, new_amount, tx, None),
        )])
    }

    async fn apply_withdraw(
        &self,
        uow: &mut dyn UnitOfWork,
        tx: &Transaction,
    ) -> Result<Vec<AuditEntry>> {
        let from = tx
            .from_user_id
            .ok_or_else(|| LedgerError::InvalidJob("withdraw requires from_user_id".to_string()))?;

        let mut balance = uow
            .locked_balance(from)
            .await?
            .ok_or(LedgerError::BalanceNotFound(from))?;

        let previous_amount = balance.amount;
        balance.debit(tx.amount)?;
        let new_amount = balance.amount;
        uow.update_balance(balance).await?;

        Ok(vec![AuditEntry::balance_change(
            from,
            AuditAction::Withdraw,
            change(previous_amount, new_amount, tx, None),
        )])
    }

    /// Both rows are locked in ascending id order regardless of direction, so
    /// two opposing transfers over the same pair can never deadlock.
    async fn apply_transfer(
        &self,
        uow: &mut dyn UnitOfWork,
        tx: &Transaction,
    ) -> Result<Vec<AuditEntry>> {
        let (Some(from), Some(to)) = (tx.from_user_id, tx.to_user_id) else {
            return Err(LedgerError::InvalidJob(
                "transfer requires from_user_id and to_user_id".to_string(),
            ));
        };

        // Uuid ordering is the canonical byte order of the identifier.
        let (first, second) = if from < to { (from, to) } else { (to, from) };
        let first_balance = uow.locked_balance(first).await?;
        let second_balance = uow.locked_balance(second).await?;
        let (from_balance, to_balance) = if first == from {
            (first_balance, second_balance)
        } else {
            (second_balance, first_balance)
        };

        // Sender funds are validated only once both locks are held.
        let mut from_balance = from_balance.ok_or(LedgerError::BalanceNotFound(from))?;
        let from_previous = from_balance.amount;
        from_balance.debit(tx.amount)?;
        let from_new = from_balance.amount;
        uow.update_balance(from_balance).await?;

        let to_previous = to_balance
            .as_ref()
            .map(|b| b.amount)
            .unwrap_or(Decimal::ZERO);
        let mut to_balance = to_balance.unwrap_or_else(|| Balance::new(to));
        to_balance.credit(tx.amount);
        let to_new = to_balance.amount;
        uow.upsert_balance(to_balance).await?;

        Ok(vec![
            AuditEntry::balance_change(
                from,
                AuditAction::TransferOut,
                change(from_previous, from_new, tx, Some(to)),
            ),
            AuditEntry::balance_change(
                to,
                AuditAction::TransferIn,
                change(to_previous, to_new, tx, Some(from)),
            ),
        ])
    }
}

fn change(
    previous_amount: Decimal,
    new_amount: Decimal,
    tx: &Transaction,
    related_user_id: Option<Uuid>,
) -> BalanceChange {
    BalanceChange {
        previous_amount,
        new_amount,
        change_amount: tx.amount.value(),
        related_user_id,
        transaction_id: Some(tx.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::LedgerStore;
    use crate::domain::transaction::TransactionStatus;
    use crate::infrastructure::in_memory::InMemoryLedgerStore;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn engine() -> (LedgerEngine, Arc<InMemoryLedgerStore>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        (LedgerEngine::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_deposit_creates_balance() {
        let (engine, store) = engine();
        let user = Uuid::new_v4();

        let job = Job::deposit(user, dec!(100.0).try_into().unwrap());
        let outcome = engine.execute(&job).await.unwrap();

        assert_eq!(outcome.transaction.status, TransactionStatus::Completed);
        assert_eq!(outcome.audit_entries.len(), 1);
        assert_eq!(outcome.audit_entries[0].details.previous_amount, dec!(0.0));
        assert_eq!(outcome.audit_entries[0].details.new_amount, dec!(100.0));

        let balance = store.balance(user).await.unwrap().unwrap();
        assert_eq!(balance.amount, dec!(100.0));
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_records_failed_transaction() {
        let (engine, store) = engine();
        let user = Uuid::new_v4();

        let seed = Job::deposit(user, dec!(50.0).try_into().unwrap());
        engine.execute(&seed).await.unwrap();

        let job = Job::withdraw(user, dec!(75.0).try_into().unwrap());
        let err = engine.execute(&job).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance));

        // Balance untouched, transaction observable as Failed.
        let balance = store.balance(user).await.unwrap().unwrap();
        assert_eq!(balance.amount, dec!(50.0));
        let failed = store.transaction(job.id).await.unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
    }

    #[tokio::test]
    async fn test_withdraw_from_unknown_user() {
        let (engine, _store) = engine();
        let job = Job::withdraw(Uuid::new_v4(), dec!(10.0).try_into().unwrap());

        let err = engine.execute(&job).await.unwrap_err();
        assert!(matches!(err, LedgerError::BalanceNotFound(_)));
    }

    #[tokio::test]
    async fn test_transfer_moves_funds_and_audits_both_sides() {
        let (engine, store) = engine();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        engine
            .execute(&Job::deposit(alice, dec!(100.0).try_into().unwrap()))
            .await
            .unwrap();

        let job = Job::transfer(alice, bob, dec!(30.0).try_into().unwrap()).unwrap();
        let outcome = engine.execute(&job).await.unwrap();

        assert_eq!(store.balance(alice).await.unwrap().unwrap().amount, dec!(70.0));
        assert_eq!(store.balance(bob).await.unwrap().unwrap().amount, dec!(30.0));

        assert_eq!(outcome.audit_entries.len(), 2);
        let out = &outcome.audit_entries[0];
        assert_eq!(out.action, AuditAction::TransferOut);
        assert_eq!(out.entity_id, alice);
        assert_eq!(out.details.related_user_id, Some(bob));
        let in_ = &outcome.audit_entries[1];
        assert_eq!(in_.action, AuditAction::TransferIn);
        assert_eq!(in_.entity_id, bob);
        assert_eq!(in_.details.related_user_id, Some(alice));
        assert_eq!(in_.details.transaction_id, Some(job.id));
    }

    #[tokio::test]
    async fn test_transfer_insufficient_leaves_both_balances() {
        let (engine, store) = engine();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        engine
            .execute(&Job::deposit(alice, dec!(20.0).try_into().unwrap()))
            .await
            .unwrap();

        let job = Job::transfer(alice, bob, dec!(30.0).try_into().unwrap()).unwrap();
        let err = engine.execute(&job).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance));

        assert_eq!(store.balance(alice).await.unwrap().unwrap().amount, dec!(20.0));
        assert!(store.balance(bob).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_job_id_rejected() {
        let (engine, store) = engine();
        let user = Uuid::new_v4();

        let job = Job::deposit(user, dec!(100.0).try_into().unwrap());
        engine.execute(&job).await.unwrap();

        let err = engine.execute(&job).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateTransaction(id) if id == job.id));

        // No double-credit.
        let balance = store.balance(user).await.unwrap().unwrap();
        assert_eq!(balance.amount, dec!(100.0));
    }
}
