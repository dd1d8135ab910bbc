//! Error types for `market-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The snapshot being merged does not carry the identifier column.
  #[error(
    "identifier column {column:?} not found; available columns: {available:?}"
  )]
  MissingIdentifierColumn {
    column:    String,
    available: Vec<String>,
  },

  /// A snapshot row has no value in the identifier column.
  #[error("row {row} has no value in identifier column {column:?}")]
  NullIdentifier { column: String, row: usize },

  #[error("duplicate column name: {0:?}")]
  DuplicateColumn(String),

  #[error("row has {found} values but the dataset has {expected} columns")]
  RowWidth { expected: usize, found: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
