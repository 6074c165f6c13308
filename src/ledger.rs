//! Persisted record of item ids that have already been downloaded.
//!
//! The ledger is a plain newline-delimited file of remote item ids. It is
//! read fully at the start of every attempt, appended to (and synced) the
//! moment an item is committed, and deleted once a whole sync succeeds.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Errors from reading, appending to or deleting the ledger file.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger file exists but could not be read.
    #[error("failed to read ledger {path}: {source}")]
    Read {
        /// Ledger file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An id could not be appended durably.
    #[error("failed to append to ledger {path}: {source}")]
    Append {
        /// Ledger file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The ledger file could not be removed.
    #[error("failed to remove ledger {path}: {source}")]
    Remove {
        /// Ledger file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Ids are single lines; an id containing a line break would corrupt
    /// the file.
    #[error("item id {id:?} cannot be stored in the ledger")]
    InvalidId {
        /// The rejected id.
        id: String,
    },
}

/// In-memory view of the ledger plus the file backing it.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    ids: HashSet<String>,
    loaded_from_disk: bool,
}

impl Ledger {
    /// Loads the ledger at `path`. A missing file yields an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Read`] if the file exists but cannot be read.
    #[instrument(level = "debug", skip(path), fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, LedgerError> {
        let (ids, loaded_from_disk) = match fs::read_to_string(path).await {
            Ok(raw) => (parse_ids(&raw), true),
            Err(error) if error.kind() == ErrorKind::NotFound => (HashSet::new(), false),
            Err(source) => {
                return Err(LedgerError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        debug!(entries = ids.len(), loaded_from_disk, "ledger loaded");
        Ok(Self {
            path: path.to_path_buf(),
            ids,
            loaded_from_disk,
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file existed when the ledger was loaded.
    #[must_use]
    pub fn loaded_from_disk(&self) -> bool {
        self.loaded_from_disk
    }

    /// Whether `id` has already been downloaded.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of recorded ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no id has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Appends `id` to the file, syncs it, then adds it to the in-memory set.
    ///
    /// The in-memory set only changes once the id is durable, so a failed
    /// append leaves the ledger exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidId`] for ids containing line breaks and
    /// [`LedgerError::Append`] if the write or sync fails.
    pub async fn record(&mut self, id: &str) -> Result<(), LedgerError> {
        if id.is_empty() || id.contains(['\n', '\r']) {
            return Err(LedgerError::InvalidId { id: id.to_string() });
        }
        if self.ids.contains(id) {
            return Ok(());
        }

        self.append_line(id).await.map_err(|source| LedgerError::Append {
            path: self.path.clone(),
            source,
        })?;
        self.ids.insert(id.to_string());
        debug!(id, entries = self.ids.len(), "ledger entry recorded");
        Ok(())
    }

    async fn append_line(&self, id: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(format!("{id}\n").as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await
    }

    /// Deletes the ledger file at `path`; a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Remove`] for any other IO failure.
    pub async fn remove_file(path: &Path) -> Result<(), LedgerError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LedgerError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

fn parse_ids(raw: &str) -> HashSet<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = Ledger::load(&temp_dir.path().join("ledger.txt")).await.unwrap();
        assert!(ledger.is_empty());
        assert!(!ledger.loaded_from_disk());
    }

    #[tokio::test]
    async fn test_load_skips_blank_lines_and_whitespace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.txt");
        std::fs::write(&path, "a1\n\n  b2 \r\nc3").unwrap();

        let ledger = Ledger::load(&path).await.unwrap();
        assert_eq!(ledger.len(), 3);
        assert!(ledger.contains("a1"));
        assert!(ledger.contains("b2"));
        assert!(ledger.contains("c3"));
        assert!(ledger.loaded_from_disk());
    }

    #[tokio::test]
    async fn test_record_is_durable_across_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("ledger.txt");

        let mut ledger = Ledger::load(&path).await.unwrap();
        ledger.record("item-1").await.unwrap();
        ledger.record("item-2").await.unwrap();
        drop(ledger);

        let reloaded = Ledger::load(&path).await.unwrap();
        assert!(reloaded.contains("item-1"));
        assert!(reloaded.contains("item-2"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "item-1\nitem-2\n"
        );
    }

    #[tokio::test]
    async fn test_record_same_id_twice_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.txt");
        let mut ledger = Ledger::load(&path).await.unwrap();

        ledger.record("item-1").await.unwrap();
        ledger.record("item-1").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "item-1\n");
    }

    #[tokio::test]
    async fn test_record_rejects_multiline_id() {
        let temp_dir = TempDir::new().unwrap();
        let mut ledger = Ledger::load(&temp_dir.path().join("ledger.txt"))
            .await
            .unwrap();

        let result = ledger.record("a\nb").await;
        assert!(matches!(result, Err(LedgerError::InvalidId { .. })));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_failed_append_leaves_memory_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        // A directory where the file should be makes the append fail.
        let path = temp_dir.path().join("ledger.txt");
        std::fs::create_dir(&path).unwrap();
        let mut ledger = Ledger {
            path: path.clone(),
            ids: HashSet::new(),
            loaded_from_disk: false,
        };

        let result = ledger.record("item-1").await;
        assert!(matches!(result, Err(LedgerError::Append { .. })));
        assert!(!ledger.contains("item-1"));
    }

    #[tokio::test]
    async fn test_remove_file_tolerates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.txt");
        Ledger::remove_file(&path).await.unwrap();

        std::fs::write(&path, "x\n").unwrap();
        Ledger::remove_file(&path).await.unwrap();
        assert!(!path.exists());
    }
}
