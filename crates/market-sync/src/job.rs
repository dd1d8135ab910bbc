//! The sync pipeline: download → decode → read → reconcile → write → verify.
//!
//! Stages run strictly in sequence and the first failing stage aborts the run.
//! Nothing is rolled back across stages: a failed write leaves the table as it
//! was, but the download and read are simply discarded.
//!
//! Two runs against the same table are not coordinated; whichever writes last
//! wins.

use chrono::Local;
use market_core::{Dataset, TableStore, reconcile};
use tracing::Instrument as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  config::JobConfig,
  decode::{decode_snapshot, stamp_collection_time},
  download::SnapshotClient,
};

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
  pub inserted:     usize,
  pub updated:      usize,
  pub retained:     usize,
  pub duplicates:   usize,
  /// Rows in the merged dataset handed to the store.
  pub written_rows: usize,
  /// Rows counted in the table after the write; `None` if the check failed.
  pub stored_rows:  Option<u64>,
}

/// Run the whole job once.
pub async fn run<S: TableStore>(
  config: &JobConfig,
  store: &S,
  client: &SnapshotClient,
) -> Result<JobReport> {
  let span = tracing::info_span!(
    "sync",
    run_id = %Uuid::new_v4(),
    table = %config.table
  );

  async {
    tracing::info!(url = %config.source_url, "downloading snapshot");
    let payload = client.fetch(&config.source_url).await?;

    let mut snapshot = decode_snapshot(&payload)?;
    tracing::info!(
      rows = snapshot.len(),
      columns = snapshot.columns().len(),
      "snapshot decoded"
    );

    if let Some(column) = config.collected_at_column() {
      stamp_collection_time(&mut snapshot, column, Local::now().naive_local());
    }

    apply_snapshot(config, store, snapshot).await
  }
  .instrument(span)
  .await
}

/// Merge an already-decoded snapshot into the configured table.
pub async fn apply_snapshot<S: TableStore>(
  config: &JobConfig,
  store: &S,
  snapshot: Dataset,
) -> Result<JobReport> {
  // Checked again by `reconcile`, but failing here skips the table read.
  if !snapshot.has_column(&config.identifier_column) {
    return Err(Error::Reconcile(market_core::Error::MissingIdentifierColumn {
      column:    config.identifier_column.clone(),
      available: snapshot.columns().to_vec(),
    }));
  }

  let existing = store
    .read_table(&config.table)
    .await
    .map_err(persistence)?;
  tracing::info!(rows = existing.len(), "loaded existing table");

  let merged = reconcile(existing, snapshot, &config.identifier_column)?;
  let stats = merged.stats;
  tracing::info!(
    inserted = stats.inserted,
    updated = stats.updated,
    retained = stats.retained,
    duplicates = stats.duplicates,
    "snapshot reconciled"
  );
  if stats.duplicates > 0 {
    tracing::warn!(
      duplicates = stats.duplicates,
      "duplicate identifiers collapsed; last row wins"
    );
  }

  let written_rows = merged.dataset.len();
  store
    .write_table(&config.table, &merged.dataset, &config.write_options())
    .await
    .map_err(persistence)?;
  tracing::info!(
    rows = written_rows,
    mode = ?config.write_mode,
    "table written"
  );

  let stored_rows = match store.count_rows(&config.table).await {
    Ok(n) => {
      tracing::info!(rows = n, "verified stored row count");
      Some(n)
    }
    Err(e) => {
      tracing::warn!(error = %e, "could not verify stored row count");
      None
    }
  };

  Ok(JobReport {
    inserted: stats.inserted,
    updated: stats.updated,
    retained: stats.retained,
    duplicates: stats.duplicates,
    written_rows,
    stored_rows,
  })
}

/// Issue a trivial query so a managed database stays awake.
pub async fn ping<S: TableStore>(store: &S) -> Result<()> {
  store.ping().await.map_err(persistence)?;
  tracing::info!("database is awake");
  Ok(())
}

fn persistence<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
  Error::Persistence(Box::new(e))
}
