//! Error types for the download module.
//!
//! Every failure a tile download can hit is a [`DownloadError`] variant. The
//! variants carry enough context (endpoint, status, path) to explain the
//! failure without ever carrying the API key.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching and storing a tile.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// No API key was available for the provider.
    #[error("no API key available: set {variable} or pass a key explicitly")]
    MissingCredential {
        /// Environment variable that was consulted.
        variable: String,
    },

    /// Transport-level error (DNS resolution, connection refused, TLS, body read).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// Provider endpoint, without query parameters.
        url: String,
        /// The underlying transport error, stripped of its URL.
        #[source]
        source: reqwest::Error,
    },

    /// Request did not complete within the transport timeout.
    #[error("timeout requesting {url}")]
    Timeout {
        /// Provider endpoint, without query parameters.
        url: String,
    },

    /// Provider answered with a 4xx/5xx status.
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        /// Provider endpoint, without query parameters.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Response body (truncated), usually the provider's error message.
        body: String,
    },

    /// Provider answered 2xx but the payload is not an image.
    #[error(
        "provider returned non-image response from {url}: status {status}, content-type '{content_type}'"
    )]
    InvalidResponse {
        /// Provider endpoint, without query parameters.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Declared content type (empty when the header was absent).
        content_type: String,
    },

    /// Every attempt failed with a retryable error.
    #[error("failed after {attempts} attempts; last error: {source}")]
    RetryExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: Box<DownloadError>,
        /// Rendered errors of the earlier attempts, oldest first.
        history: Vec<String>,
    },

    /// Directory creation or file write failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configured provider endpoint is not a valid URL.
    #[error("invalid endpoint URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl DownloadError {
    /// Creates a missing-credential error for the given environment variable.
    pub fn missing_credential(variable: impl Into<String>) -> Self {
        Self::MissingCredential {
            variable: variable.into(),
        }
    }

    /// Creates a network error from a reqwest error.
    ///
    /// The request URL is stripped from `source` because it contains the key.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source: source.without_url(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Creates an invalid (non-image) response error.
    pub fn invalid_response(
        url: impl Into<String>,
        status: u16,
        content_type: impl Into<String>,
    ) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            status,
            content_type: content_type.into(),
        }
    }

    /// Creates a retry-exhausted error wrapping the final attempt's error.
    pub fn retry_exhausted(attempts: u32, last: DownloadError, history: Vec<String>) -> Self {
        Self::RetryExhausted {
            attempts,
            source: Box::new(last),
            history,
        }
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

    /// Returns true for transport failures, timeouts and non-2xx statuses.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::HttpStatus { .. }
        )
    }

    /// Returns the error of the final attempt for [`Self::RetryExhausted`],
    /// or `self` for every other variant.
    #[must_use]
    pub fn last_error(&self) -> &DownloadError {
        match self {
            Self::RetryExhausted { source, .. } => source,
            other => other,
        }
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// endpoint or path as context, so callers go through the constructors above.
