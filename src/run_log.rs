//! Per-run diagnostic log file.
//!
//! Each process run gets one append-only text file named after its start
//! time. Entries look like:
//!
//! ```text
//! 04/01/2023 10:20:30 - Timeout Error: Failed to download file: Receipt
//!     Saved to: /data/Invoices
//!     timeout downloading https://files.example/abc.pdf
//! ********************************************************************************
//! ```
//!
//! The file complements, not replaces, the `tracing` output on stderr: it is
//! what a user inspects after an unattended run.

use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::warn;

/// File name format of run logs.
const FILE_NAME_FORMAT: &str = "%m-%d-%Y_%H-%M-%S";

/// Timestamp format inside entries.
const ENTRY_TIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Width of the separator line closing each entry.
const SEPARATOR_WIDTH: usize = 80;

/// Append-only diagnostic log for one run.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    /// Creates `dir` if needed and returns a log whose file is named after
    /// `started`. The file itself is created by the first entry.
    ///
    /// # Errors
    ///
    /// Returns the IO error if `dir` cannot be created.
    pub fn create(dir: &Path, started: DateTime<Local>) -> std::io::Result<Self> {
        fs::create_dir_all(dir)?;
        let name = format!("{}.txt", started.format(FILE_NAME_FORMAT));
        Ok(Self {
            path: dir.join(name),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes an entry with a class, a context line and optional detail
    /// lines (each indented under the headline).
    ///
    /// Write failures are reported through `tracing` and otherwise ignored:
    /// losing a diagnostic line must never fail the sync.
    pub fn entry(&self, class: &str, context: &str, details: &[&str]) {
        let text = format_entry(Local::now(), class, context, details);
        if let Err(error) = self.append(&text) {
            warn!(path = %self.path.display(), %error, "failed to write run log entry");
        }
    }

    /// Writes the "Attempt n" marker.
    pub fn attempt(&self, attempt: u32) {
        self.entry(&format!("Attempt {attempt}"), "", &[]);
    }

    fn append(&self, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())
    }
}

/// Renders one entry, including its trailing separator line.
#[must_use]
pub fn format_entry(at: DateTime<Local>, class: &str, context: &str, details: &[&str]) -> String {
    let mut text = format!("{} - {class}", at.format(ENTRY_TIME_FORMAT));
    if !context.is_empty() {
        let _ = write!(text, ": {context}");
    }
    text.push('\n');
    for detail in details {
        let _ = writeln!(text, "\t{detail}");
    }
    text.push_str(&"*".repeat(SEPARATOR_WIDTH));
    text.push('\n');
    text
}
