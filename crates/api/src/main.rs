//! Fraud Shield - Main Entry Point

use anyhow::{Context, Result};
use api::startup::build_workflow;
use api::{init_logging, run_server, AppConfig};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use transaction::{Transaction, TransactionReader};
use workflow::{run_batch, BatchSummary};

#[derive(Debug, Parser)]
#[command(name = "fraud-shield", version, about = "Transaction fraud decisions")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = api::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Bind address, overriding the configuration
        #[arg(long)]
        addr: Option<String>,
    },
    /// Decide one transaction given as `Amount=120.5, V2=3.6`
    Score { query: String },
    /// Decide every transaction in a CSV file
    Batch {
        path: PathBuf,
        /// Concurrent workers, overriding the configuration
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load_from_path(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    init_logging(&config.logging)?;

    info!("=== Fraud Shield v{} ===", env!("CARGO_PKG_VERSION"));
    let workflow = Arc::new(build_workflow(&config)?);

    match cli.command {
        Command::Serve { addr } => {
            if let Some(addr) = addr {
                config.server.addr = addr;
            }
            run_server(&config, workflow).await?;
        }
        Command::Score { query } => {
            let transaction = Transaction::from_query(&query)
                .with_context(|| format!("Invalid transaction '{}'", query))?;
            let record = tokio::task::spawn_blocking(move || workflow.run(transaction)).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Batch { path, workers } => {
            let reader = TransactionReader::from_path(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;

            let mut transactions = Vec::new();
            for (row, result) in reader.transactions()?.enumerate() {
                match result {
                    Ok(transaction) => transactions.push(transaction),
                    Err(e) => warn!(row = row + 1, error = %e, "Skipping unreadable row"),
                }
            }
            info!(count = transactions.len(), "Transactions read from {}", path.display());

            let workers = workers.unwrap_or(config.batch.workers);
            let records = run_batch(workflow, transactions, workers).await;
            let summary = BatchSummary::from_records(&records);

            let output = json!({ "summary": summary, "records": records });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
