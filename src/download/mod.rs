//! Satellite tile download: single fetch, bounded retry, and batch orchestration.
//!
//! # Layers
//!
//! - [`StaticMapClient`] ([`ImageSource`]) - one HTTP request per tile,
//!   content-type validation, atomic write
//! - [`RetryingDownloader`] - bounded retry with exponential backoff
//! - [`BatchRunner`] - deterministic filenames, skip-if-exists, tallies
//!
//! # Example
//!
//! ```no_run
//! use imagery_core::download::{Coordinate, DownloadRequest, RetryPolicy, RetryingDownloader, StaticMapClient};
//! use imagery_core::ApiKey;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = RetryingDownloader::new(StaticMapClient::new(), RetryPolicy::default());
//! let request = DownloadRequest::new(Coordinate::new(-37.8136, 144.9631), 19, 640, "tile.jpg");
//! let path = downloader.fetch_with_retry(&request, &ApiKey::from_env()?).await?;
//! println!("Downloaded: {}", path.display());
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
pub mod constants;
mod error;
mod filename;
mod persist;
mod request;
mod retry;

pub use batch::{
    BatchReport, BatchRunner, BatchSettings, BatchStats, PlannedRecord, RecordOutcome,
    RecordReport, plan_batch,
};
pub use client::{ImageSource, StaticMapClient};
pub use constants::{
    DEFAULT_ENDPOINT, DEFAULT_IMAGE_SIZE, DEFAULT_OUTPUT_DIR, DEFAULT_ZOOM, MAX_IMAGE_SIZE,
    REQUEST_TIMEOUT_SECS,
};
pub use error::DownloadError;
pub use filename::{sanitize_label, tile_filename, tile_path};
pub use request::{Coordinate, DownloadRequest};
pub use retry::{
    DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, FailureType, RetriedDownload, RetryDecision,
    RetryPolicy, RetryingDownloader, classify_error,
};
