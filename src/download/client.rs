//! HTTP client wrapper for fetching item payloads.
//!
//! This module provides the `HttpClient` struct which streams a response
//! body to a file with short, fixed timeouts and removes the file again if
//! the transfer does not complete.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;
use crate::api::ClientTimeouts;
use crate::api::http_client::build_guarded;
use crate::user_agent;

/// Default connect timeout for item downloads (1 second).
pub const DOWNLOAD_CONNECT_TIMEOUT_SECS: u64 = 1;

/// Default idle read timeout for item downloads (1 second).
///
/// Slow responses are treated as failures and picked up by the next
/// attempt rather than stalling the whole walk.
pub const DOWNLOAD_READ_TIMEOUT_SECS: u64 = 1;

/// HTTP client for item payloads.
///
/// Carries no API credentials: item download URLs are pre-signed.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default download timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest build error if the client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::new_with_timeouts(
            Duration::from_secs(DOWNLOAD_CONNECT_TIMEOUT_SECS),
            Duration::from_secs(DOWNLOAD_READ_TIMEOUT_SECS),
        )
    }

    /// Creates a client with explicit connect and read timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest build error if the client cannot be constructed.
    pub fn new_with_timeouts(connect: Duration, read: Duration) -> Result<Self, reqwest::Error> {
        let timeouts = ClientTimeouts {
            connect: Some(connect),
            read: Some(read),
        };
        let client = build_guarded("download", timeouts, |builder| {
            builder.user_agent(user_agent::default_download_user_agent())
        })?;
        Ok(Self { client })
    }

    /// Streams `url` into a newly created file at `path`, returning the
    /// number of bytes written.
    ///
    /// The file is flushed and synced before returning. On any error the
    /// file is removed, so a path left behind is always complete.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to disk fails
    #[instrument(skip(self, path), fields(url = %url))]
    pub async fn fetch_to_file(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let mut file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        let result = stream_to_file(&mut file, response, url, path).await;
        drop(file);

        if result.is_err() {
            debug!(path = %path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(path).await;
        }
        result
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(&mut *file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    drop(writer);

    file.sync_all()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_to_file_rejects_invalid_url_without_creating_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("doc.pdf");
        let client = HttpClient::new().unwrap();

        let result = client.fetch_to_file("not a url", &target).await;

        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
        assert!(!target.exists());
    }
}
