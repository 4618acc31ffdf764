use crate::domain::balance::Balance;
use crate::error::Result;
use std::io::Write;

/// Writes final balance state as CSV with columns `user_id, amount`.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes all balances, sorted by user id for deterministic output.
    pub fn write_balances(&mut self, mut balances: Vec<Balance>) -> Result<()> {
        balances.sort_by_key(|b| b.user_id);

        self.writer.write_record(["user_id", "amount"])?;
        for balance in balances {
            self.writer
                .write_record([balance.user_id.to_string(), balance.amount.to_string()])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
