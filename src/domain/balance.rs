use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Represents a strictly positive monetary amount for jobs and transactions.
///
/// This is a wrapper around `rust_decimal::Decimal` to enforce domain-specific rules
/// and provide type safety for financial calculations.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Integer minor currency units (cents), used for aggregate counters
    /// that must not accumulate floating-point drift. Saturates on overflow.
    pub fn minor_units(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .unwrap_or(i64::MAX)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The state of a user's balance. One row per user, created on first credit
/// and mutated in place thereafter.
///
/// Invariant: `amount` is never negative. `debit` is the only mutation that
/// could violate this and refuses to.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Balance {
    /// The unique identifier for the owning user.
    pub user_id: Uuid,
    /// The current balance, in major currency units with fixed-point precision.
    pub amount: Decimal,
    /// When the balance was last mutated.
    pub last_updated_at: DateTime<Utc>,
}

impl Balance {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            amount: Decimal::ZERO,
            last_updated_at: Utc::now(),
        }
    }

    /// Credits funds to the balance.
    pub fn credit(&mut self, amount: Amount) {
        self.amount += amount.value();
        self.last_updated_at = Utc::now();
    }

    /// Debits funds from the balance if sufficient.
    pub fn debit(&mut self, amount: Amount) -> Result<(), LedgerError> {
        if self.amount < amount.value() {
            return Err(LedgerError::InsufficientBalance);
        }
        self.amount -= amount.value();
        self.last_updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(LedgerError::ValidationError(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(LedgerError::ValidationError(_))
        ));
    }

    #[test]
    fn test_amount_minor_units() {
        let amount = Amount::new(dec!(12.34)).unwrap();
        assert_eq!(amount.minor_units(), 1234);

        let amount = Amount::new(dec!(0.5)).unwrap();
        assert_eq!(amount.minor_units(), 50);
    }

    #[test]
    fn test_balance_credit() {
        let mut balance = Balance::new(Uuid::new_v4());
        balance.credit(Amount::new(dec!(10.0)).unwrap());
        assert_eq!(balance.amount, dec!(10.0));
    }

    #[test]
    fn test_balance_debit_success() {
        let mut balance = Balance::new(Uuid::new_v4());
        balance.credit(Amount::new(dec!(10.0)).unwrap());

        let result = balance.debit(Amount::new(dec!(4.0)).unwrap());
        assert!(result.is_ok());
        assert_eq!(balance.amount, dec!(6.0));
    }

    #[test]
    fn test_balance_debit_insufficient() {
        let mut balance = Balance::new(Uuid::new_v4());
        balance.credit(Amount::new(dec!(10.0)).unwrap());

        let result = balance.debit(Amount::new(dec!(20.0)).unwrap());
        assert!(matches!(result, Err(LedgerError::InsufficientBalance)));
        assert_eq!(balance.amount, dec!(10.0));
    }

    #[test]
    fn test_balance_never_negative_on_exact_debit() {
        let mut balance = Balance::new(Uuid::new_v4());
        balance.credit(Amount::new(dec!(7.5)).unwrap());

        balance.debit(Amount::new(dec!(7.5)).unwrap()).unwrap();
        assert_eq!(balance.amount, dec!(0.0));
    }
}
