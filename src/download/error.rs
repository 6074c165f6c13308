//! Error types for the download module.
//!
//! This module defines structured errors for item downloads, providing
//! context-rich messages for the run log and for tracing output.

use std::path::PathBuf;

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors that can occur while downloading a single item.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create file, write, rename, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The item's download URL is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The file was written but the ledger could not record it.
    #[error("failed to record {path} in the ledger: {source}")]
    Ledger {
        /// The file that was rolled back.
        path: PathBuf,
        /// The underlying ledger error.
        #[source]
        source: LedgerError,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::timeout(url)
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a ledger commit error.
    pub fn ledger(path: impl Into<PathBuf>, source: LedgerError) -> Self {
        Self::Ledger {
            path: path.into(),
            source,
        }
    }

    /// Short human-readable class used in run log entries.
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::Network { .. } => "Connection Error",
            Self::Timeout { .. } => "Timeout Error",
            Self::HttpStatus { .. } => "HTTP Error",
            Self::Io { .. } | Self::Ledger { .. } => "File Error",
            Self::InvalidUrl { .. } => "Unknown Error",
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// url or path, which the source errors don't carry.
