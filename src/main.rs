//! payflow CLI
//!
//! Replays a file of payment operations against an account table.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --accounts accounts.csv operations.jsonl > out.txt
//! cargo run -- --config config/production.json --log-format json --accounts accounts.csv operations.jsonl
//! ```
//!
//! Stdout receives one JSON outcome line per operation followed by the final
//! account table as CSV. Logs, including every relayed transaction change,
//! go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (individual operations may still have failed)
//! - 1: Error (bad arguments or config, unreadable input, store failure)

use anyhow::Context;
use payflow::cli::{self, CliArgs};
use payflow::config::EngineConfig;
use payflow::core::PaymentEngine;
use payflow::io::{read_accounts, write_accounts_csv, OperationReader};
use payflow::logging::init_logging;
use payflow::relay::{LogPublisher, Relay};
use payflow::runner::{RunSummary, Runner};
use payflow::store::{MemoryAccountStore, MemoryRequestStore, MemoryTransactionStore};
use std::process;
use std::sync::Arc;
use tracing::info;

fn main() {
    let args = cli::parse_args();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = EngineConfig::load(args.config_file.as_deref())?;
    init_logging(
        &config.log_level,
        args.log_format.unwrap_or(config.log_format),
    )?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(replay(args, config))
}

async fn replay(args: CliArgs, config: EngineConfig) -> anyhow::Result<()> {
    let accounts = read_accounts(&args.accounts_file).map_err(anyhow::Error::msg)?;
    info!(accounts = accounts.len(), "account table loaded");

    let accounts = Arc::new(MemoryAccountStore::with_accounts(accounts));
    let transactions = Arc::new(MemoryTransactionStore::new());
    let feed = transactions.subscribe();
    let change_log = transactions.change_log();
    let engine = PaymentEngine::new(
        accounts.clone(),
        transactions.clone(),
        Arc::new(MemoryRequestStore::new()),
        config.limits,
    );

    let relay = tokio::spawn(async move {
        let mut relay = Relay::new(LogPublisher);
        relay.run(feed, &change_log).await
    });

    let operations_file = args.operations_file;
    let summary = tokio::task::spawn_blocking(move || -> anyhow::Result<RunSummary> {
        let operations = OperationReader::new(&operations_file).map_err(anyhow::Error::msg)?;
        let stdout = std::io::stdout();
        let mut output = stdout.lock();
        let mut runner = Runner::new(&engine);
        runner.run(operations, &mut output)
    })
    .await
    .context("operation worker panicked")??;

    // The engine went away with the worker; dropping the last store handle
    // closes the feed so the relay can drain and stop.
    drop(transactions);
    let watermark = relay.await.context("relay task panicked")??;
    info!(
        watermark,
        applied = summary.applied,
        failed = summary.failed,
        "relay drained"
    );

    let mut stdout = std::io::stdout();
    write_accounts_csv(&accounts.snapshot(), &mut stdout).map_err(anyhow::Error::msg)?;
    Ok(())
}
