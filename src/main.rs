use clap::Parser;
use ledgerd::application::service::{LedgerConfig, LedgerService};
use ledgerd::infrastructure::in_memory::{InMemoryAuditSink, InMemoryCache, InMemoryLedgerStore};
use ledgerd::interfaces::csv::balance_writer::BalanceWriter;
use ledgerd::interfaces::csv::job_reader::JobReader;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input jobs CSV file (columns: type, from, to, amount)
    input: PathBuf,

    /// Number of concurrent workers
    #[arg(long, default_value_t = 5)]
    workers: usize,

    /// Bounded job queue capacity
    #[arg(long, default_value_t = 100)]
    queue_capacity: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let store = Arc::new(InMemoryLedgerStore::new());
    let audit_sink = Arc::new(InMemoryAuditSink::new());
    let cache = Arc::new(InMemoryCache::new());

    let service = LedgerService::new(
        store.clone(),
        audit_sink,
        cache,
        LedgerConfig {
            workers: cli.workers,
            queue_capacity: cli.queue_capacity,
            ..LedgerConfig::default()
        },
    );
    service.start().await;

    // Process jobs
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = JobReader::new(file);
    for job_result in reader.jobs() {
        match job_result {
            Ok(job) => {
                if let Err(e) = service.submit_and_wait(job).await {
                    eprintln!("Error processing job: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading job: {}", e);
            }
        }
    }

    service.stop().await;

    // Output final state
    let balances = store.all_balances().await;
    let stdout = io::stdout();
    let mut writer = BalanceWriter::new(stdout.lock());
    writer.write_balances(balances).into_diagnostic()?;

    let stats = service.stats();
    eprintln!(
        "processed={} successful={} failed={} credited={} debited={} transferred={}",
        stats.total_processed,
        stats.total_successful,
        stats.total_failed,
        stats.total_credited,
        stats.total_debited,
        stats.total_transferred,
    );

    Ok(())
}
