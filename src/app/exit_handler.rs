//! Exit code logic for the downloader process.
//!
//! Single responsibility: map batch totals to the process exit outcome.

use imagery_core::BatchStats;

use crate::ProcessExit;

/// Determines the process exit outcome from batch totals.
///
/// Per-record failures are reported but only change the exit code once their
/// rate exceeds `max_failure_rate`. With the default of 1.0 that never happens.
pub(crate) fn determine_exit_outcome(stats: &BatchStats, max_failure_rate: f64) -> ProcessExit {
    if stats.failure_rate() > max_failure_rate {
        ProcessExit::FailureThreshold
    } else {
        ProcessExit::Success
    }
}
