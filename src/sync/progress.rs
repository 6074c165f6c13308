//! Console output for sync runs: status lines plus a per-folder item bar.

use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};

/// Decides what a sync run prints to the terminal.
///
/// Status lines go to stdout unless quiet; item bars are drawn on stderr only
/// when `bars` is set (callers pass `stderr().is_terminal()`).
#[derive(Debug, Clone, Copy)]
pub struct Console {
    quiet: bool,
    bars: bool,
}

impl Console {
    /// Creates console output settings.
    #[must_use]
    pub fn new(quiet: bool, bars: bool) -> Self {
        Self {
            quiet,
            bars: bars && !quiet,
        }
    }

    /// Prints nothing at all. Used by tests and embedding callers.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(true, false)
    }

    /// Prints one status line.
    pub fn line(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    /// Returns a bar over `len` items labelled with the folder's name, or a
    /// hidden bar when bars are disabled.
    #[must_use]
    pub fn folder_bar(&self, dir: &Path, len: usize) -> ProgressBar {
        if !self.bars {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::with_template("{msg}: {percent:>3}%|{bar:30}| {pos}/{len} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let label = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        bar.set_message(label);
        bar
    }
}
