//! The `TableStore` trait and its write options.
//!
//! Implemented by storage backends (e.g. `market-store-sqlite`). The job
//! pipeline depends on this abstraction, not on a concrete backend.

use std::future::Future;

use serde::Deserialize;

use crate::Dataset;

// ─── Write options ───────────────────────────────────────────────────────────

/// How [`TableStore::write_table`] treats an existing table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
  /// Drop the table and recreate it from the dataset's columns.
  #[default]
  Replace,
  /// Keep the table definition (keys, declared types), delete every row, then
  /// append the dataset. Columns the table lacks are added.
  DeleteAppend,
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
  pub mode:        WriteMode,
  /// Column declared `PRIMARY KEY` when the table is (re)created.
  pub primary_key: Option<String>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A relational store holding whole-table snapshots.
///
/// Writes replace the full contents of a table in one transaction. Nothing
/// coordinates concurrent writers: two jobs writing the same table race and
/// the last one wins.
pub trait TableStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read every row of `table`. An absent table reads as an empty dataset.
  fn read_table<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<Dataset, Self::Error>> + Send + 'a;

  /// Replace the contents of `table` with `dataset`.
  fn write_table<'a>(
    &'a self,
    table: &'a str,
    dataset: &'a Dataset,
    options: &'a WriteOptions,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Number of rows currently stored in `table`.
  fn count_rows<'a>(
    &'a self,
    table: &'a str,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Issue a trivial query to check (and keep alive) the connection.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
