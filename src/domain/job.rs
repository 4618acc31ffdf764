use crate::domain::balance::Amount;
use crate::domain::transaction::{Transaction, TransactionKind};
use crate::error::LedgerError;
use uuid::Uuid;

/// A unit of work submitted to the worker pool. Transient: owned by the
/// submitter until a worker consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub from_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    pub amount: Amount,
}

/// Delivered exactly once per waited-on job: the committed transaction or a
/// typed error.
pub type JobResult = Result<Transaction, LedgerError>;

impl Job {
    pub fn deposit(to_user_id: Uuid, amount: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TransactionKind::Deposit,
            from_user_id: None,
            to_user_id: Some(to_user_id),
            amount,
        }
    }

    pub fn withdraw(from_user_id: Uuid, amount: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TransactionKind::Withdraw,
            from_user_id: Some(from_user_id),
            to_user_id: None,
            amount,
        }
    }

    pub fn transfer(from_user_id: Uuid, to_user_id: Uuid, amount: Amount) -> Result<Self, LedgerError> {
        let job = Self {
            id: Uuid::new_v4(),
            kind: TransactionKind::Transfer,
            from_user_id: Some(from_user_id),
            to_user_id: Some(to_user_id),
            amount,
        };
        job.validate()?;
        Ok(job)
    }

    /// Checks kind-specific shape before the job enters the queue.
    pub fn validate(&self) -> Result<(), LedgerError> {
        match self.kind {
            TransactionKind::Deposit => {
                if self.to_user_id.is_none() {
                    return Err(LedgerError::InvalidJob(
                        "deposit requires to_user_id".to_string(),
                    ));
                }
            }
            TransactionKind::Withdraw => {
                if self.from_user_id.is_none() {
                    return Err(LedgerError::InvalidJob(
                        "withdraw requires from_user_id".to_string(),
                    ));
                }
            }
            TransactionKind::Transfer => {
                let (Some(from), Some(to)) = (self.from_user_id, self.to_user_id) else {
                    return Err(LedgerError::InvalidJob(
                        "transfer requires from_user_id and to_user_id".to_string(),
                    ));
                };
                if from == to {
                    return Err(LedgerError::InvalidJob(
                        "cannot transfer to yourself".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
