//! HTTP retrieval of the remote snapshot file.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;

use crate::{Error, Result};

/// Async HTTP client for the snapshot source.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SnapshotClient {
  client: Client,
}

impl SnapshotClient {
  /// Build a client whose requests give up after `timeout`.
  pub fn new(timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(concat!("market-sync/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| {
        Error::Configuration(format!("failed to build HTTP client: {e}"))
      })?;
    Ok(Self { client })
  }

  /// `GET url`, returning the raw body.
  ///
  /// Transport failures and timeouts are [`Error::Download`]; a non-2xx
  /// status is [`Error::DownloadStatus`].
  pub async fn fetch(&self, url: &str) -> Result<Bytes> {
    let download_err = |source| Error::Download { url: url.to_owned(), source };

    let resp = self.client.get(url).send().await.map_err(download_err)?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::DownloadStatus { url: url.to_owned(), status });
    }

    let body = resp.bytes().await.map_err(download_err)?;
    tracing::debug!(bytes = body.len(), "snapshot downloaded");
    Ok(body)
  }
}
