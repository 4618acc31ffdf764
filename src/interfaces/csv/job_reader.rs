use crate::domain::balance::Amount;
use crate::domain::job::Job;
use crate::domain::transaction::TransactionKind;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct JobRecord {
    r#type: TransactionKind,
    from: Option<Uuid>,
    to: Option<Uuid>,
    amount: Decimal,
}

/// Reads ledger jobs from a CSV source with columns `type, from, to, amount`.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Job>`.
/// It handles whitespace trimming and flexible record lengths automatically;
/// each job is validated (amount positivity, kind-specific shape) before it
/// is yielded.
pub struct JobReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> JobReader<R> {
    /// Creates a new `JobReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads, deserializes and validates jobs.
    pub fn jobs(self) -> impl Iterator<Item = Result<Job>> {
        self.reader
            .into_deserialize::<JobRecord>()
            .map(|result| {
                let record = result?;
                let job = Job {
                    id: Uuid::new_v4(),
                    kind: record.r#type,
                    from_user_id: record.from,
                    to_user_id: record.to,
                    amount: Amount::new(record.amount)?,
                };
                job.validate()?;
                Ok(job)
            })
    }
}
