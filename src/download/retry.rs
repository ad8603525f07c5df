//! Retry logic with exponential backoff for transient tile failures.
//!
//! This module provides [`RetryPolicy`], the [`FailureType`] classification of
//! [`DownloadError`]s, and [`RetryingDownloader`], which drives an
//! [`ImageSource`] through the policy.
//!
//! # Overview
//!
//! When a fetch fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - network errors, non-2xx statuses and
//!   non-image payloads; the provider may recover (throttling, quota blips)
//! - [`FailureType::Permanent`] - local filesystem errors, missing credential,
//!   bad endpoint; retrying would not help
//!
//! Transient failures are retried until `max_attempts` is reached, sleeping
//! `initial_delay * 2^(attempt-1)` between attempts. Permanent failures
//! propagate on first occurrence.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use imagery_core::download::{RetryDecision, RetryPolicy, FailureType};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(1));
//! match policy.should_retry(FailureType::Transient, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         assert_eq!(delay, Duration::from_secs(1));
//!         assert_eq!(attempt, 2);
//!     }
//!     RetryDecision::DoNotRetry { reason } => panic!("{reason}"),
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument, warn};

use super::client::ImageSource;
use super::error::DownloadError;
use super::request::DownloadRequest;
use crate::credential::ApiKey;

/// Default maximum attempts (including the first).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before the first retry (1 second).
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

/// Classification of download failure types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: timeout, HTTP 429/5xx, quota message served as 200 + JSON.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: disk full, permission denied, missing API key.
    Permanent,
}

/// Decision on whether to retry a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Bounded retry with exponential backoff.
///
/// # Delay Calculation
///
/// ```text
/// delay(attempt) = initial_delay * 2^(attempt - 1) + jitter
/// ```
///
/// where `attempt` is the 1-indexed attempt that just failed and jitter is
/// uniform in `[0, max_jitter]` (zero unless [`with_jitter`](Self::with_jitter)
/// is used). With defaults the delays are 1s, 2s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay before the first retry.
    initial_delay: Duration,

    /// Upper bound of random jitter added to each delay.
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INITIAL_DELAY)
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` below 1 is raised to 1.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_jitter: Duration::ZERO,
        }
    }

    /// Creates a policy with a custom `max_attempts` and the default delay.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(max_attempts, DEFAULT_INITIAL_DELAY)
    }

    /// Adds uniform random jitter up to `max_jitter` to every delay.
    ///
    /// Useful when several runs share one API key.
    #[must_use]
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay before the first retry.
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Determines whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.delay_for(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    /// Delay to wait after `attempt` (1-indexed) failed: `initial_delay * 2^(attempt-1)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let base = self.initial_delay.saturating_mul(1_u32 << exponent);
        base.saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        let max_ms = u64::try_from(self.max_jitter.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

/// Classifies a download error for retry decisions.
///
/// | Error | Type | Rationale |
/// |-------|------|-----------|
/// | Network | Transient | Connection may recover |
/// | Timeout | Transient | Provider may be slow momentarily |
/// | HttpStatus | Transient | Throttling (429) and 5xx are common and temporary |
/// | InvalidResponse | Transient | Quota messages served as 200 may clear |
/// | RetryExhausted | Permanent | Already retried |
/// | Io | Permanent | Local file system issue |
/// | MissingCredential | Permanent | Configuration problem |
/// | InvalidUrl | Permanent | Configuration problem |
#[must_use]
pub fn classify_error(error: &DownloadError) -> FailureType {
    match error {
        DownloadError::Network { .. }
        | DownloadError::Timeout { .. }
        | DownloadError::HttpStatus { .. }
        | DownloadError::InvalidResponse { .. } => FailureType::Transient,

        DownloadError::RetryExhausted { .. }
        | DownloadError::Io { .. }
        | DownloadError::MissingCredential { .. }
        | DownloadError::InvalidUrl { .. } => FailureType::Permanent,
    }
}

/// A path plus the number of attempts it took to produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriedDownload {
    /// Where the tile was written.
    pub path: PathBuf,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Wraps an [`ImageSource`] with a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryingDownloader<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: ImageSource> RetryingDownloader<S> {
    /// Creates a downloader driving `source` through `policy`.
    #[must_use]
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Fetches a tile, retrying transient failures with exponential backoff.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::RetryExhausted`] wrapping the last error once every
    ///   attempt failed transiently.
    /// - Permanent errors ([`DownloadError::Io`],
    ///   [`DownloadError::MissingCredential`], [`DownloadError::InvalidUrl`])
    ///   unchanged, on first occurrence.
    pub async fn fetch_with_retry(
        &self,
        request: &DownloadRequest,
        credential: &ApiKey,
    ) -> Result<PathBuf, DownloadError> {
        self.fetch_with_attempts(request, credential)
            .await
            .map(|download| download.path)
    }

    /// Like [`fetch_with_retry`](Self::fetch_with_retry), also reporting how
    /// many attempts were needed.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_with_retry`](Self::fetch_with_retry).
    #[instrument(
        skip(self, request, credential),
        fields(
            lat = request.coordinate().lat,
            lon = request.coordinate().lon,
            max_attempts = self.policy.max_attempts,
        )
    )]
    pub async fn fetch_with_attempts(
        &self,
        request: &DownloadRequest,
        credential: &ApiKey,
    ) -> Result<RetriedDownload, DownloadError> {
        let mut history = Vec::new();
        let mut attempt: u32 = 1;

        loop {
            let error = match self.source.fetch(request, credential).await {
                Ok(path) => {
                    if attempt > 1 {
                        debug!(attempt, "succeeded after retry");
                    }
                    return Ok(RetriedDownload {
                        path,
                        attempts: attempt,
                    });
                }
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            match self.policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "attempt failed, backing off"
                    );
                    history.push(error.to_string());
                    tokio::time::sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    if failure_type == FailureType::Permanent {
                        debug!(%reason, "not retrying");
                        return Err(error);
                    }
                    warn!(attempts = attempt, error = %error, "giving up");
                    return Err(DownloadError::retry_exhausted(attempt, error, history));
                }
            }
        }
    }
}
