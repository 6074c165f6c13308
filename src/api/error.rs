//! Error types for the remote API client.

use thiserror::Error;

/// Errors that can occur while talking to the Neat API.
///
/// Every variant carries the endpoint that failed so run log entries can
/// point at the exact call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection-level failure (DNS, refused connection, TLS, reset).
    #[error("connection error calling {endpoint}: {source}")]
    Transport {
        /// The endpoint that was being called.
        endpoint: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The call did not complete within the configured API timeout.
    #[error("timeout calling {endpoint}")]
    Timeout {
        /// The endpoint that timed out.
        endpoint: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} calling {endpoint}")]
    HttpStatus {
        /// The endpoint that returned the status.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not the JSON shape the listing expects.
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode {
        /// The endpoint whose response could not be decoded.
        endpoint: String,
        /// Decoder error text.
        message: String,
    },

    /// The endpoint path could not be joined onto the API base URL.
    #[error("invalid API endpoint {endpoint}")]
    InvalidEndpoint {
        /// The offending endpoint path.
        endpoint: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build API client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl ApiError {
    /// Maps a reqwest send/read error to `Timeout` or `Transport`.
    pub fn transport(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        let endpoint = endpoint.into();
        if source.is_timeout() {
            Self::Timeout { endpoint }
        } else if source.is_decode() {
            Self::Decode {
                endpoint,
                message: source.to_string(),
            }
        } else {
            Self::Transport { endpoint, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(endpoint: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            endpoint: endpoint.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(endpoint: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    /// Creates an invalid endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
        }
    }

    /// Returns true when the server refused the supplied credentials.
    ///
    /// Only meaningful for errors returned by the token endpoint.
    #[must_use]
    pub fn is_credentials_rejected(&self) -> bool {
        matches!(self, Self::HttpStatus { status: 401 | 403, .. })
    }

    /// The endpoint the error belongs to, if any.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Timeout { endpoint }
            | Self::HttpStatus { endpoint, .. }
            | Self::Decode { endpoint, .. }
            | Self::InvalidEndpoint { endpoint } => Some(endpoint),
            Self::ClientBuild(_) => None,
        }
    }

    /// Short human-readable class used in run log entries.
    #[must_use]
    pub fn class(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::ClientBuild(_) => "Connection Error",
            Self::Timeout { .. } => "Timeout Error",
            Self::HttpStatus { .. } => "HTTP Error",
            Self::Decode { .. } => "Decode Error",
            Self::InvalidEndpoint { .. } => "Unknown Error",
        }
    }
}
