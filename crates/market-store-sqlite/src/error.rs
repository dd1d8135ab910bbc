//! Error type for `market-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] market_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A write option named a column the dataset does not have.
  #[error("column {column:?} does not exist in the data written to {table:?}")]
  UnknownColumn { table: String, column: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
