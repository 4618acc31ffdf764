use crate::domain::transaction::TransactionStatus;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: TransactionStatus,
        to: TransactionStatus,
    },
    #[error("no balance record for user {0}")]
    BalanceNotFound(Uuid),
    #[error("transaction {0} already exists")]
    DuplicateTransaction(Uuid),
    #[error("invalid job: {0}")]
    InvalidJob(String),
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("worker pool is not running")]
    PoolClosed,
    #[error("result channel closed before delivery")]
    ResultChannelClosed,
    #[error("store failure: {0}")]
    StoreFailure(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
