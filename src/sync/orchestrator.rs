//! Runs whole-tree attempts until one succeeds or the budget is spent.

use std::path::PathBuf;

use tracing::{error, info, instrument, warn};

use super::error::SyncError;
use super::progress::Console;
use super::retry::{AttemptBackoff, AttemptOutcome, RetryState};
use super::walker::{TreeWalker, WalkReport};
use crate::api::{ClientTimeouts, Credentials, NeatClient};
use crate::config::SyncSettings;
use crate::download::{HttpClient, ItemDownloader, folder_dir_name};
use crate::ledger::Ledger;
use crate::run_log::RunLog;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalState {
    /// An attempt walked the whole tree without a failure.
    Done {
        /// Attempt number that succeeded.
        attempts: u32,
        /// Report of the successful attempt.
        report: WalkReport,
    },
    /// Every attempt failed.
    Exhausted {
        /// Attempts made.
        attempts: u32,
    },
    /// A failure that retrying cannot fix ended the run early.
    Fatal {
        /// Attempts made.
        attempts: u32,
    },
}

/// Process exit outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// The mirror is complete.
    Success,
    /// All attempts failed; the ledger is kept for the next run.
    Exhausted,
    /// Unusable input, invalid configuration or rejected credentials.
    Fatal,
}

impl ProcessExit {
    /// Numeric exit code: 0, 1 or 2.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Exhausted => 1,
            Self::Fatal => 2,
        }
    }
}

impl From<FinalState> for ProcessExit {
    fn from(state: FinalState) -> Self {
        match state {
            FinalState::Done { .. } => Self::Success,
            FinalState::Exhausted { .. } => Self::Exhausted,
            FinalState::Fatal { .. } => Self::Fatal,
        }
    }
}

/// Drives the attempt state machine for one run.
#[derive(Debug)]
pub struct Orchestrator {
    settings: SyncSettings,
    credentials: Credentials,
    run_log: RunLog,
    console: Console,
    backoff: AttemptBackoff,
}

impl Orchestrator {
    /// Creates an orchestrator. Backoff between attempts follows
    /// `settings.retry_base_delay`.
    #[must_use]
    pub fn new(
        settings: SyncSettings,
        credentials: Credentials,
        run_log: RunLog,
        console: Console,
    ) -> Self {
        let backoff = AttemptBackoff::with_base_delay(settings.retry_base_delay);
        Self {
            settings,
            credentials,
            run_log,
            console,
            backoff,
        }
    }

    /// Runs attempts until `Done` or `Exhausted`.
    ///
    /// On `Done` the ledger file is deleted; otherwise it stays so the next
    /// invocation skips everything already downloaded.
    pub async fn run(&self) -> FinalState {
        let max_attempts = self.settings.max_attempts;
        let mut state = RetryState::initial();
        let mut fatal = false;
        let mut last_report = WalkReport::default();
        let mut attempts = 0;

        while let RetryState::Attempting(attempt) = state {
            attempts = attempt;
            let (outcome, report) = self.attempt(attempt).await;
            last_report = report;
            fatal = outcome == AttemptOutcome::FailedFatal;
            state = state.next(outcome, max_attempts);

            if let RetryState::Attempting(_) = state {
                self.console.line(&format!(
                    "Attempt {attempt} did not complete successfully. Reattempting..."
                ));
                tokio::time::sleep(self.backoff.delay_after(attempt)).await;
            }
        }

        if state == RetryState::Done {
            self.finish_done().await;
            return FinalState::Done {
                attempts,
                report: last_report,
            };
        }

        error!(attempts, fatal, "sync did not complete");
        if fatal {
            self.console
                .line("Neat file download stopped: the credentials were rejected.");
            FinalState::Fatal { attempts }
        } else {
            self.console.line(&format!(
                "Neat file download did not complete after {attempts} attempts. \
                 Run again to resume; already downloaded files will be skipped."
            ));
            FinalState::Exhausted { attempts }
        }
    }

    /// Runs one attempt and classifies it.
    #[instrument(skip(self))]
    async fn attempt(&self, attempt: u32) -> (AttemptOutcome, WalkReport) {
        self.console.line(&format!("Attempt {attempt}"));
        self.run_log.attempt(attempt);

        match self.try_attempt().await {
            Ok(report) if report.had_failures() => {
                warn!(?report, "attempt finished with failures");
                (AttemptOutcome::FailedRetryable, report)
            }
            Ok(report) => {
                info!(?report, "attempt succeeded");
                (AttemptOutcome::Succeeded, report)
            }
            Err(error) => {
                let fatal = error.is_fatal();
                warn!(%error, fatal, "attempt aborted");
                self.run_log.entry("Unknown error", &error.to_string(), &[]);
                let outcome = if fatal {
                    AttemptOutcome::FailedFatal
                } else {
                    AttemptOutcome::FailedRetryable
                };
                (outcome, WalkReport::default())
            }
        }
    }

    async fn try_attempt(&self) -> Result<WalkReport, SyncError> {
        let ledger_path = self.settings.ledger_path();
        let mut ledger = Ledger::load(&ledger_path)
            .await
            .map_err(SyncError::LedgerLoad)?;
        if !ledger.loaded_from_disk() {
            self.run_log.entry(
                &format!("{} does not exist", ledger_path.display()),
                "starting with an empty ledger",
                &[],
            );
        }

        let timeouts = ClientTimeouts {
            connect: self.settings.api_timeout,
            read: self.settings.api_timeout,
        };
        let client =
            NeatClient::new(&self.settings.api_base, timeouts).map_err(SyncError::ApiClient)?;
        let session = client
            .authenticate(&self.credentials)
            .await
            .map_err(SyncError::Authentication)?;

        let http = HttpClient::new_with_timeouts(
            self.settings.download_connect_timeout,
            self.settings.download_read_timeout,
        )
        .map_err(SyncError::DownloadClient)?;
        let downloader = ItemDownloader::new(http);
        let walker = TreeWalker::new(&client, &session, &downloader, &self.run_log, self.console);

        let mut report = WalkReport::default();
        for folder in session.top_level_folders() {
            let dir = top_level_dir(&self.settings, &folder.name, &folder.id);
            walker.walk(&folder.id, &dir, &mut ledger, &mut report).await;
        }
        Ok(report)
    }

    async fn finish_done(&self) {
        let ledger_path = self.settings.ledger_path();
        if let Err(error) = Ledger::remove_file(&ledger_path).await {
            warn!(%error, "could not remove ledger after a complete sync");
            self.run_log.entry("File Error", &error.to_string(), &[]);
        }
        info!("sync complete");
        self.console.line("Neat file download Complete");
    }
}

/// Local directory for a top-level folder.
///
/// A folder whose name would land on the state directory is mirrored under
/// its id instead.
fn top_level_dir(settings: &SyncSettings, name: &str, folder_id: &str) -> PathBuf {
    let dir = settings.dest.join(folder_dir_name(name, folder_id));
    if dir == settings.state_dir {
        warn!(folder_id, name, "folder name clashes with the state directory; using its id");
        return settings.dest.join(folder_dir_name("", folder_id));
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_dir_uses_sanitized_name() {
        let settings = SyncSettings::new("/mirror");
        assert_eq!(
            top_level_dir(&settings, "Tax: 2023", "f-1"),
            PathBuf::from("/mirror/Tax_ 2023")
        );
    }

    #[test]
    fn test_top_level_dir_avoids_state_directory() {
        let settings = SyncSettings::new("/mirror");
        assert_eq!(
            top_level_dir(&settings, ".neat-mirror", "f-state"),
            PathBuf::from("/mirror/f-state")
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Exhausted.code(), 1);
        assert_eq!(ProcessExit::Fatal.code(), 2);
    }

    #[test]
    fn test_exit_from_final_state() {
        let done = FinalState::Done {
            attempts: 2,
            report: WalkReport::default(),
        };
        assert_eq!(ProcessExit::from(done), ProcessExit::Success);
        assert_eq!(
            ProcessExit::from(FinalState::Exhausted { attempts: 5 }),
            ProcessExit::Exhausted
        );
        assert_eq!(
            ProcessExit::from(FinalState::Fatal { attempts: 1 }),
            ProcessExit::Fatal
        );
    }
}
