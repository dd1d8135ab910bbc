//! Error type for the sync job.
//!
//! One variant family per pipeline stage. Every variant is terminal for the
//! run; the binary logs it and exits non-zero.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("failed to download {url}: {source}")]
  Download {
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("download of {url} returned {status}")]
  DownloadStatus {
    url:    String,
    status: reqwest::StatusCode,
  },

  #[error("failed to decompress snapshot: {0}")]
  Decompress(#[source] std::io::Error),

  #[error("failed to parse snapshot csv: {0}")]
  Csv(#[from] csv::Error),

  #[error("malformed snapshot: {0}")]
  Malformed(String),

  #[error(transparent)]
  Reconcile(#[from] market_core::Error),

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<config::ConfigError> for Error {
  fn from(e: config::ConfigError) -> Self { Self::Configuration(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
