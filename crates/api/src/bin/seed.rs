//! Load an extraction export into Postgres.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use spendlens_api::config::DEFAULT_MAX_CONNECTIONS;
use spendlens_infra::{ingest_file, PostgresRecordStore};

#[derive(Debug, Parser)]
#[command(name = "spendlens-seed", about = "Load an extraction export into the record store")]
struct Cli {
    /// JSON array of extraction documents.
    #[arg(long, env = "SEED_FILE")]
    file: PathBuf,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Append to existing records instead of replacing them.
    #[arg(long)]
    keep_existing: bool,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    spendlens_observability::init_for_cli();
    let cli = Cli::parse();

    let store = PostgresRecordStore::connect(&cli.database_url, cli.max_connections, Duration::from_secs(30))
        .await
        .context("failed to connect to postgres")?;
    store.ensure_schema().await.context("failed to create schema")?;

    let result = ingest_file(&store, &cli.file, Utc::now().date_naive(), !cli.keep_existing).await;
    store.close().await;

    let report = result.with_context(|| format!("failed to ingest {}", cli.file.display()))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
