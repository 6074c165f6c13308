//! Depth-first walk of one remote folder tree into a local directory.
//!
//! For every folder the walker lists its subfolders, makes sure the local
//! directory exists, downloads the folder's own items and then descends into
//! the subfolders in listing order. Listing and download failures are
//! recorded in the [`WalkReport`] and the run log; they never abort sibling
//! branches.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::progress::Console;
use crate::api::{ApiError, FolderNode, ItemRecord, NeatClient, SessionContext};
use crate::download::{DownloadError, ItemDownloader, ItemOutcome, folder_dir_name, item_file_stem};
use crate::ledger::Ledger;
use crate::run_log::RunLog;

/// Counters for one attempt's walk.
///
/// Any failure counter above zero marks the attempt as failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Folders whose local directory exists and whose items were processed.
    pub folders_visited: usize,
    /// Items written and committed in this attempt.
    pub items_downloaded: usize,
    /// Items skipped because the ledger already had them.
    pub items_skipped: usize,
    /// Items that failed to download or commit.
    pub item_failures: usize,
    /// Subfolder or item listings that failed.
    pub listing_failures: usize,
    /// Local directories that could not be created.
    pub directory_failures: usize,
}

impl WalkReport {
    /// Whether anything in the walk failed.
    #[must_use]
    pub fn had_failures(&self) -> bool {
        self.item_failures > 0 || self.listing_failures > 0 || self.directory_failures > 0
    }
}

/// A folder waiting on the walk stack.
#[derive(Debug)]
struct PendingFolder {
    id: String,
    dir: PathBuf,
}

/// Walks remote folders and mirrors them locally.
///
/// Borrowing everything it needs keeps one walker cheap to build per
/// attempt; the mutable ledger and report are passed per call.
#[derive(Debug)]
pub struct TreeWalker<'a> {
    client: &'a NeatClient,
    session: &'a SessionContext,
    downloader: &'a ItemDownloader,
    run_log: &'a RunLog,
    console: Console,
}

impl<'a> TreeWalker<'a> {
    /// Creates a walker for one attempt.
    #[must_use]
    pub fn new(
        client: &'a NeatClient,
        session: &'a SessionContext,
        downloader: &'a ItemDownloader,
        run_log: &'a RunLog,
        console: Console,
    ) -> Self {
        Self {
            client,
            session,
            downloader,
            run_log,
            console,
        }
    }

    /// Mirrors the folder `folder_id` and its whole subtree into `dir`.
    ///
    /// Folders are visited depth-first, each folder's items before its
    /// subfolders and subfolders in listing order. An explicit stack keeps
    /// deep trees off the call stack without changing that order.
    #[instrument(skip(self, dir, ledger, report), fields(dir = %dir.display()))]
    pub async fn walk(
        &self,
        folder_id: &str,
        dir: &Path,
        ledger: &mut Ledger,
        report: &mut WalkReport,
    ) {
        let mut stack = vec![PendingFolder {
            id: folder_id.to_string(),
            dir: dir.to_path_buf(),
        }];

        while let Some(folder) = stack.pop() {
            let subfolders = self.subfolders(&folder, report).await;

            if let Err(error) = tokio::fs::create_dir_all(&folder.dir).await {
                report.directory_failures += 1;
                warn!(dir = %folder.dir.display(), %error, "cannot create local folder; skipping subtree");
                self.run_log.entry(
                    "File Error",
                    &format!("Failed to create folder: {}", folder.dir.display()),
                    &[error.to_string().as_str()],
                );
                continue;
            }
            report.folders_visited += 1;

            self.process_items(&folder, ledger, report).await;

            for subfolder in subfolders.iter().rev() {
                stack.push(PendingFolder {
                    id: subfolder.id.clone(),
                    dir: folder.dir.join(folder_dir_name(&subfolder.name, &subfolder.id)),
                });
            }
        }
    }

    /// Lists a folder's subfolders; a failed listing counts as empty.
    async fn subfolders(&self, folder: &PendingFolder, report: &mut WalkReport) -> Vec<FolderNode> {
        match self.client.list_subfolders(self.session, &folder.id).await {
            Ok(subfolders) => {
                debug!(folder_id = %folder.id, count = subfolders.len(), "subfolders listed");
                subfolders
            }
            Err(error) => {
                self.listing_failed(&error, &folder.dir, report);
                Vec::new()
            }
        }
    }

    async fn process_items(
        &self,
        folder: &PendingFolder,
        ledger: &mut Ledger,
        report: &mut WalkReport,
    ) {
        let items = match self.client.list_items(self.session, &folder.id).await {
            Ok(items) => items,
            Err(error) => {
                self.listing_failed(&error, &folder.dir, report);
                return;
            }
        };

        self.console
            .line(&format!("Processing folder: {}", folder.dir.display()));
        let bar = self.console.folder_bar(&folder.dir, items.len());

        for item in &items {
            match self.downloader.process(item, &folder.dir, ledger).await {
                Ok(ItemOutcome::Downloaded(path)) => {
                    report.items_downloaded += 1;
                    debug!(path = %path.display(), "downloaded");
                }
                Ok(ItemOutcome::AlreadyDownloaded) => report.items_skipped += 1,
                Err(error) => {
                    report.item_failures += 1;
                    self.item_failed(item, &folder.dir, &error);
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        info!(
            dir = %folder.dir.display(),
            items = items.len(),
            "folder processed"
        );
    }

    fn listing_failed(&self, error: &ApiError, dir: &Path, report: &mut WalkReport) {
        report.listing_failures += 1;
        warn!(dir = %dir.display(), %error, "listing failed; continuing without it");
        let folder = format!("Folder: {}", dir.display());
        let details = error.to_string();
        self.run_log.entry(
            error.class(),
            &format!("Failed complete API call: {}", error.endpoint().unwrap_or("unknown")),
            &[folder.as_str(), details.as_str()],
        );
    }

    fn item_failed(&self, item: &ItemRecord, dir: &Path, error: &DownloadError) {
        warn!(item_id = %item.id, dir = %dir.display(), %error, "item failed");
        let saved_to = format!("Saved to: {}", dir.display());
        let details = error.to_string();
        self.run_log.entry(
            error.class(),
            &format!("Failed to download file: {}", item_file_stem(item)),
            &[saved_to.as_str(), details.as_str()],
        );
    }
}
