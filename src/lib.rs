//! Neat Mirror Core Library
//!
//! This library mirrors a Neat cloud document account (folders and their
//! items) into a local directory tree. Downloads are recorded in a persisted
//! ledger so that retried or restarted runs never fetch an item twice.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`api`] - Remote folder/item API client, session and pagination
//! - [`download`] - Item file naming, streaming fetch and timestamp restoration
//! - [`ledger`] - Append-only record of already-downloaded item ids
//! - [`run_log`] - Per-run diagnostic log file
//! - [`sync`] - Tree walker and the retry orchestrator
//! - [`config`] - File configuration and resolved run settings

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod download;
pub mod ledger;
pub mod run_log;
pub mod sync;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiError, Credentials, NeatClient, SessionContext};
pub use config::{CliOverrides, ConfigError, FileConfig, SyncSettings};
pub use download::{DownloadError, HttpClient, ItemDownloader, ItemOutcome, sanitize};
pub use ledger::{Ledger, LedgerError};
pub use run_log::RunLog;
pub use sync::{
    AttemptOutcome, Console, FinalState, Orchestrator, ProcessExit, RetryState, SyncError,
    TreeWalker, WalkReport,
};
