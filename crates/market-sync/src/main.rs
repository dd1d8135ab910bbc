//! market-sync binary.
//!
//! Reads `market-sync.toml` (or the path given with `--config`), opens the
//! SQLite store named by the database url, and runs one sync or a ping.
//!
//! ```
//! DATABASE_URL=sqlite:///var/lib/market.db market-sync
//! market-sync --config /etc/market-sync.toml ping
//! ```
//!
//! Exits with status 1 after logging the error if any stage fails, so a
//! scheduler can alert on failed runs.

use std::{path::PathBuf, process::ExitCode};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use market_store_sqlite::SqliteStore;
use market_sync::{DatabaseLocation, JobConfig, SnapshotClient};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Merge the market snapshot into its table")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "market-sync.toml")]
  config: PathBuf,

  /// Database url; overrides the configuration file.
  #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
  database_url: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
  /// Download the snapshot and merge it into the table (default).
  Run,
  /// Run `SELECT 1` to keep the database awake.
  Ping,
}

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  match run(Cli::parse()).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("{e:#}");
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
  let config = JobConfig::load(&cli.config, cli.database_url)
    .context("failed to load configuration")?;

  let store = match config.database_location()? {
    DatabaseLocation::Memory => SqliteStore::open_in_memory()
      .await
      .context("failed to open in-memory database")?,
    DatabaseLocation::File(path) => SqliteStore::open(&path)
      .await
      .with_context(|| format!("failed to open database at {path:?}"))?,
  };

  match cli.command.unwrap_or(Command::Run) {
    Command::Run => {
      let client = SnapshotClient::new(config.download_timeout())?;
      let report = market_sync::run(&config, &store, &client)
        .await
        .context("sync failed")?;
      tracing::info!(
        inserted = report.inserted,
        updated = report.updated,
        retained = report.retained,
        stored = ?report.stored_rows,
        "sync complete"
      );
    }
    Command::Ping => {
      market_sync::ping(&store).await.context("ping failed")?;
    }
  }

  Ok(())
}
