//! Batch orchestration over a list of labeled coordinates.
//!
//! [`BatchRunner`] walks the records strictly in input order. For each one it
//! derives the deterministic tile path, skips it if the file is already on
//! disk, and otherwise hands a fresh [`DownloadRequest`] to the
//! [`RetryingDownloader`]. A record's failure is tallied and never aborts the
//! batch.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use imagery_core::download::{BatchRunner, BatchSettings, RetryPolicy, RetryingDownloader, StaticMapClient};
//! use imagery_core::parser::LabeledCoordinate;
//! use imagery_core::ApiKey;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = RetryingDownloader::new(StaticMapClient::new(), RetryPolicy::default());
//! let settings = BatchSettings::new(19, 640, PathBuf::from("data/raw"));
//! let runner = BatchRunner::new(downloader, ApiKey::from_env()?, settings);
//!
//! let records = vec![LabeledCoordinate::new(-37.8136, 144.9631, "crossing_001")];
//! let report = runner.run(&records).await;
//! println!(
//!     "Success: {}, Skipped: {}, Failed: {}",
//!     report.stats.succeeded, report.stats.skipped, report.stats.failed
//! );
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use super::client::ImageSource;
use super::constants::{DEFAULT_IMAGE_SIZE, DEFAULT_OUTPUT_DIR, DEFAULT_ZOOM};
use super::filename::tile_path;
use super::request::{Coordinate, DownloadRequest};
use super::retry::RetryingDownloader;
use crate::credential::ApiKey;
use crate::parser::LabeledCoordinate;

/// Per-run download parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Zoom level for every tile.
    pub zoom: u8,
    /// Square tile size in pixels.
    pub size: u16,
    /// Directory tiles are written to.
    pub output_dir: PathBuf,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::new(DEFAULT_ZOOM, DEFAULT_IMAGE_SIZE, PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

impl BatchSettings {
    /// Creates settings.
    #[must_use]
    pub fn new(zoom: u8, size: u16, output_dir: PathBuf) -> Self {
        Self {
            zoom,
            size,
            output_dir,
        }
    }
}

/// What happened to one record. The three outcomes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// The tile was downloaded.
    Succeeded {
        /// Where the tile was written.
        path: PathBuf,
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// The tile was already on disk; the downloader was not called.
    Skipped {
        /// The existing tile.
        path: PathBuf,
    },
    /// The download failed terminally.
    Failed {
        /// Where the tile would have been written.
        path: PathBuf,
        /// Rendered error.
        error: String,
    },
}

impl RecordOutcome {
    /// The tile path this outcome refers to.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Succeeded { path, .. } | Self::Skipped { path } | Self::Failed { path, .. } => {
                path
            }
        }
    }
}

/// Outcome of one record, with its position in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    /// 1-indexed position in the input.
    pub index: usize,
    /// Number of records in the batch.
    pub total: usize,
    /// Record label (trimmed).
    pub label: String,
    /// Record coordinate.
    pub coordinate: Coordinate,
    /// What happened.
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

/// Running totals for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    /// Records downloaded.
    pub succeeded: usize,
    /// Records already on disk.
    pub skipped: usize,
    /// Records that failed.
    pub failed: usize,
    /// Extra attempts spent on retries across all records.
    pub retried: usize,
}

impl BatchStats {
    /// Returns the number of records processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    /// Returns the number of records that needed a download.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Fraction of attempted records that failed; 0.0 when nothing was attempted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn failure_rate(&self) -> f64 {
        let attempted = self.attempted();
        if attempted == 0 {
            0.0
        } else {
            self.failed as f64 / attempted as f64
        }
    }

    fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Succeeded { attempts, .. } => {
                self.succeeded += 1;
                self.retried += usize::try_from(attempts.saturating_sub(1)).unwrap_or(0);
            }
            RecordOutcome::Skipped { .. } => self.skipped += 1,
            RecordOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Ordered per-record outcomes plus totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// One entry per input record, in input order.
    pub records: Vec<RecordReport>,
    /// Totals over `records`.
    pub stats: BatchStats,
}

/// What a run would do with a record, computed without network access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRecord {
    /// Record label (trimmed).
    pub label: String,
    /// Target tile path.
    pub path: PathBuf,
    /// True if the tile already exists and would be skipped.
    pub exists: bool,
}

/// Sequential batch driver around a [`RetryingDownloader`].
#[derive(Debug)]
pub struct BatchRunner<S> {
    downloader: RetryingDownloader<S>,
    credential: ApiKey,
    settings: BatchSettings,
}

impl<S: ImageSource> BatchRunner<S> {
    /// Creates a runner.
    #[must_use]
    pub fn new(downloader: RetryingDownloader<S>, credential: ApiKey, settings: BatchSettings) -> Self {
        Self {
            downloader,
            credential,
            settings,
        }
    }

    /// The settings in use.
    #[must_use]
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Processes every record in order.
    pub async fn run(&self, records: &[LabeledCoordinate]) -> BatchReport {
        self.run_with_progress(records, |_| {}).await
    }

    /// Processes every record in order, calling `on_record` after each one.
    #[instrument(skip_all, fields(records = records.len(), zoom = self.settings.zoom))]
    pub async fn run_with_progress<F>(
        &self,
        records: &[LabeledCoordinate],
        mut on_record: F,
    ) -> BatchReport
    where
        F: FnMut(&RecordReport) + Send,
    {
        let total = records.len();
        let mut report = BatchReport::default();
        info!(total, output_dir = %self.settings.output_dir.display(), "starting batch");

        for (offset, record) in records.iter().enumerate() {
            let outcome = self.process_record(record).await;
            report.stats.record(&outcome);
            let entry = RecordReport {
                index: offset + 1,
                total,
                label: record.label.clone(),
                coordinate: record.coordinate(),
                outcome,
            };
            on_record(&entry);
            report.records.push(entry);
        }

        info!(
            succeeded = report.stats.succeeded,
            skipped = report.stats.skipped,
            failed = report.stats.failed,
            retried = report.stats.retried,
            "batch complete"
        );
        report
    }

    async fn process_record(&self, record: &LabeledCoordinate) -> RecordOutcome {
        let coordinate = record.coordinate();
        let path = tile_path(
            &self.settings.output_dir,
            &record.label,
            coordinate,
            self.settings.zoom,
        );

        if tile_exists(&path).await {
            debug!(label = %record.label, path = %path.display(), "already exists, skipping");
            return RecordOutcome::Skipped { path };
        }

        let request = DownloadRequest::new(coordinate, self.settings.zoom, self.settings.size, &path);
        match self
            .downloader
            .fetch_with_attempts(&request, &self.credential)
            .await
        {
            Ok(download) => RecordOutcome::Succeeded {
                path: download.path,
                attempts: download.attempts,
            },
            Err(error) => {
                warn!(label = %record.label, %coordinate, error = %error, "record failed");
                RecordOutcome::Failed {
                    path,
                    error: error.to_string(),
                }
            }
        }
    }
}

/// Classifies records against the output directory without a credential.
pub async fn plan_batch(settings: &BatchSettings, records: &[LabeledCoordinate]) -> Vec<PlannedRecord> {
    let mut planned = Vec::with_capacity(records.len());
    for record in records {
        let path = tile_path(
            &settings.output_dir,
            &record.label,
            record.coordinate(),
            settings.zoom,
        );
        let exists = tile_exists(&path).await;
        planned.push(PlannedRecord {
            label: record.label.clone(),
            path,
            exists,
        });
    }
    planned
}

async fn tile_exists(path: &std::path::Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default_is_zero() {
        let stats = BatchStats::default();
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.attempted(), 0);
        assert!((stats.failure_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stats_record_counts_each_outcome() {
        let mut stats = BatchStats::default();
        stats.record(&RecordOutcome::Succeeded {
            path: PathBuf::from("a.jpg"),
            attempts: 3,
        });
        stats.record(&RecordOutcome::Skipped {
            path: PathBuf::from("b.jpg"),
        });
        stats.record(&RecordOutcome::Failed {
            path: PathBuf::from("c.jpg"),
            error: "boom".to_string(),
        });

        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.retried, 2);
        assert_eq!(stats.total(), 3);
        assert!((stats.failure_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failure_rate_ignores_skipped_records() {
        let stats = BatchStats {
            succeeded: 0,
            skipped: 10,
            failed: 1,
            retried: 0,
        };
        assert!((stats.failure_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_outcome_path_accessor() {
        let outcome = RecordOutcome::Failed {
            path: PathBuf::from("x.jpg"),
            error: String::new(),
        };
        assert_eq!(outcome.path(), &PathBuf::from("x.jpg"));
    }

    #[test]
    fn test_record_report_serializes_flat_outcome() {
        let report = RecordReport {
            index: 1,
            total: 1,
            label: "crossing_001".to_string(),
            coordinate: Coordinate::new(-37.8136, 144.9631),
            outcome: RecordOutcome::Skipped {
                path: PathBuf::from("data/raw/crossing_001.jpg"),
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["label"], "crossing_001");
        assert_eq!(json["path"], "data/raw/crossing_001.jpg");
        assert_eq!(json["coordinate"]["lat"], -37.8136);
    }

    #[test]
    fn test_default_settings_match_documented_defaults() {
        let settings = BatchSettings::default();
        assert_eq!(settings.zoom, 20);
        assert_eq!(settings.size, 640);
        assert_eq!(settings.output_dir, PathBuf::from("data/raw"));
    }

    #[tokio::test]
    async fn test_plan_batch_flags_existing_tiles() {
        let temp = tempfile::TempDir::new().unwrap();
        let settings = BatchSettings::new(19, 640, temp.path().to_path_buf());
        let records = vec![
            LabeledCoordinate::new(-37.8136, 144.9631, "crossing_001"),
            LabeledCoordinate::new(-37.8140, 144.9640, "crossing_002"),
        ];
        std::fs::write(
            temp.path().join("crossing_001_-37.813600_144.963100_z19.jpg"),
            b"jpeg",
        )
        .unwrap();

        let planned = plan_batch(&settings, &records).await;

        assert_eq!(planned.len(), 2);
        assert!(planned[0].exists);
        assert!(!planned[1].exists);
        assert_eq!(planned[1].label, "crossing_002");
    }
}
