//! Downloading one item: fetch, write, restore timestamps, commit.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::client::HttpClient;
use super::error::DownloadError;
use super::filename::{item_file_stem, partial_path, resolve_collision_free_path};
use super::times::{FileTimestamps, apply_timestamps, parse_server_time};
use crate::api::ItemRecord;
use crate::ledger::Ledger;

/// Result of handing one item to the downloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The item was written to this path and committed to the ledger.
    Downloaded(PathBuf),
    /// The item was already in the ledger.
    AlreadyDownloaded,
}

/// Downloads items into their folder and records them in the ledger.
///
/// The sequence for one item is:
///
/// 1. pick a free `<stem>.pdf` / `<stem> (N).pdf` path
/// 2. stream the payload into `<path>.part`
/// 3. restore modification/creation time on the partial file
/// 4. rename it to the final path
/// 5. append the id to the ledger (the commit point)
///
/// A failure in 2-4 removes the partial file; a failure in 5 removes the
/// final file. Either way nothing is left that the next attempt would need
/// to rename around.
#[derive(Debug, Clone)]
pub struct ItemDownloader {
    client: HttpClient,
}

impl ItemDownloader {
    /// Creates a downloader using `client` for payload requests.
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Downloads `item` into `dest` unless the ledger already has it.
    ///
    /// # Errors
    ///
    /// Returns the [`DownloadError`] of the failed step. The ledger is left
    /// unchanged on every error.
    #[instrument(skip(self, item, dest, ledger), fields(item_id = %item.id))]
    pub async fn process(
        &self,
        item: &ItemRecord,
        dest: &Path,
        ledger: &mut Ledger,
    ) -> Result<ItemOutcome, DownloadError> {
        if ledger.contains(&item.id) {
            debug!("already in ledger; skipping");
            return Ok(ItemOutcome::AlreadyDownloaded);
        }

        let stem = item_file_stem(item);
        let target = resolve_collision_free_path(dest, &stem);
        let partial = partial_path(&target);

        if let Err(error) = self.write_partial(item, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(error);
        }

        if let Err(source) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(DownloadError::io(&target, source));
        }

        if let Err(source) = ledger.record(&item.id).await {
            warn!(path = %target.display(), "ledger append failed; removing downloaded file");
            let _ = tokio::fs::remove_file(&target).await;
            return Err(DownloadError::ledger(&target, source));
        }

        info!(path = %target.display(), "item downloaded");
        Ok(ItemOutcome::Downloaded(target))
    }

    async fn write_partial(&self, item: &ItemRecord, partial: &Path) -> Result<(), DownloadError> {
        let bytes = self.client.fetch_to_file(&item.download_url, partial).await?;
        debug!(bytes, path = %partial.display(), "payload written");

        let timestamps = FileTimestamps {
            created: parse_server_time(&item.created_at),
            modified: parse_server_time(&item.updated_at),
        };
        if timestamps.created.is_none() || timestamps.modified.is_none() {
            warn!(
                created_at = %item.created_at,
                updated_at = %item.updated_at,
                "unparseable server timestamp; leaving it unrestored"
            );
        }
        let owned = partial.to_path_buf();
        tokio::task::spawn_blocking(move || apply_timestamps(&owned, timestamps))
            .await
            .map_err(std::io::Error::other)
            .and_then(std::convert::identity)
            .map_err(|e| DownloadError::io(partial, e))
    }
}
