//! Provider API key handling.
//!
//! The key is resolved once at the orchestration boundary (usually from the
//! environment) and passed down explicitly. Its `Debug` output is redacted so
//! it cannot leak through `tracing` fields or error chains.

use std::env;
use std::fmt;

use crate::download::DownloadError;

/// Environment variable holding the imagery provider API key.
pub const API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Secret token authenticating requests to the imagery provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps an explicitly supplied key. The value is kept exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::MissingCredential`] if the key is empty or
    /// only whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, DownloadError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DownloadError::missing_credential(API_KEY_ENV));
        }
        Ok(Self(value))
    }

    /// Reads the key from [`API_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::MissingCredential`] if the variable is unset,
    /// not valid unicode, or empty.
    pub fn from_env() -> Result<Self, DownloadError> {
        Self::from_env_var(API_KEY_ENV)
    }

    /// Reads the key from an arbitrary environment variable.
    ///
    /// Surrounding whitespace is stripped, since shell exports and `.env`
    /// files often carry a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::MissingCredential`] naming `variable` if it is
    /// unset, not valid unicode, or empty.
    pub fn from_env_var(variable: &str) -> Result<Self, DownloadError> {
        let value = env::var(variable).unwrap_or_default();
        Self::new(value.trim()).map_err(|_| DownloadError::missing_credential(variable))
    }

    /// Returns the raw key for placing into a request.
    #[must_use]
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}
