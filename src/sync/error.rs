//! Errors that end an attempt before or outside the walk.

use thiserror::Error;

use crate::api::ApiError;
use crate::ledger::LedgerError;

/// Failures that escape an attempt.
///
/// Listing and item failures never show up here; the walker absorbs them
/// into its report. What remains is setup: ledger, clients, authentication.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The ledger could not be read at attempt start.
    #[error("could not load ledger: {0}")]
    LedgerLoad(#[source] LedgerError),

    /// The API client could not be created.
    #[error("could not create API client: {0}")]
    ApiClient(#[source] ApiError),

    /// The payload download client could not be created.
    #[error("could not create download client: {0}")]
    DownloadClient(#[source] reqwest::Error),

    /// Login, account or root folder lookup failed.
    #[error("authentication failed: {0}")]
    Authentication(#[source] ApiError),
}

impl SyncError {
    /// Whether retrying cannot help.
    ///
    /// Only a 401/403 from the token endpoint qualifies: the password is
    /// wrong and will stay wrong for every further attempt.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Authentication(error) => {
                error.is_credentials_rejected() && error.endpoint() == Some("token")
            }
            _ => false,
        }
    }
}
