//! Imagery Downloader Core Library
//!
//! Downloads satellite imagery tiles for lists of labeled coordinates, the
//! first step of building a labeled imagery dataset.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - tile fetching, retry with backoff, batch orchestration
//! - [`parser`] - coordinate CSV input
//! - [`credential`] - provider API key handling
//!
//! Configuration and the command line live in the `imagery-downloader`
//! binary; library functions take every setting as an explicit parameter.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod credential;
pub mod download;
pub mod parser;

// Re-export commonly used types
pub use credential::{API_KEY_ENV, ApiKey};
pub use download::{
    BatchReport, BatchRunner, BatchSettings, BatchStats, Coordinate, DownloadError,
    DownloadRequest, ImageSource, RecordOutcome, RetryPolicy, RetryingDownloader,
    StaticMapClient,
};
pub use parser::{InputError, LabeledCoordinate, read_coordinates};
