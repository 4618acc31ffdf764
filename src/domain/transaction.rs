use crate::domain::balance::Amount;
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Transfer => "transfer",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A transaction record. Created as `Pending`, finalized exactly once to a
/// terminal status, immutable thereafter.
///
/// Deposit carries only `to_user_id`, Withdraw only `from_user_id`, Transfer
/// carries both.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: Uuid,
    pub from_user_id: Option<Uuid>,
    pub to_user_id: Option<Uuid>,
    pub amount: Amount,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: Uuid,
        kind: TransactionKind,
        from_user_id: Option<Uuid>,
        to_user_id: Option<Uuid>,
        amount: Amount,
    ) -> Self {
        Self {
            id,
            from_user_id,
            to_user_id,
            amount,
            kind,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Only `Pending -> {Completed, Failed, Cancelled}` is legal.
    fn transition(&mut self, to: TransactionStatus) -> Result<(), LedgerError> {
        if self.status != TransactionStatus::Pending {
            return Err(LedgerError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), LedgerError> {
        self.transition(TransactionStatus::Completed)
    }

    pub fn fail(&mut self) -> Result<(), LedgerError> {
        self.transition(TransactionStatus::Failed)
    }

    pub fn cancel(&mut self) -> Result<(), LedgerError> {
        self.transition(TransactionStatus::Cancelled)
    }

    pub fn is_final(&self) -> bool {
        self.status != TransactionStatus::Pending
    }
}
