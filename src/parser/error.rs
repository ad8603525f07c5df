//! Error types for coordinate input parsing.

use std::path::PathBuf;

use thiserror::Error;

/// Columns every coordinates file must provide.
pub const REQUIRED_COLUMNS: [&str; 3] = ["lat", "lon", "label"];

/// Errors that can occur while reading a coordinates CSV.
#[derive(Debug, Error)]
pub enum InputError {
    /// The file could not be opened or read.
    #[error("cannot read coordinates file {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The header row lacks a required column.
    #[error(
        "coordinates file is missing required column '{column}'\n  Suggestion: the header row must contain lat, lon and label"
    )]
    MissingColumn {
        /// Name of the absent column.
        column: &'static str,
    },

    /// A row could not be parsed.
    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord {
        /// 1-indexed line number in the file (the header is line 1).
        line: u64,
        /// Why the record was rejected.
        reason: String,
    },

    /// CSV-level failure with no row position (e.g. unreadable header).
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl InputError {
    /// Creates an `InvalidRecord` error.
    #[must_use]
    pub fn invalid_record(line: u64, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            line,
            reason: reason.into(),
        }
    }
}
