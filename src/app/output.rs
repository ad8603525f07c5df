//! User-facing run output: per-record lines, completion summary, JSON report.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use imagery_core::{BatchReport, BatchStats, RecordOutcome};
use imagery_core::download::RecordReport;
use tracing::{info, warn};

/// Logs one processed record as `[i/n] ...`.
pub(crate) fn log_record(report: &RecordReport) {
    let position = format!("[{}/{}]", report.index, report.total);
    match &report.outcome {
        RecordOutcome::Succeeded { attempts, .. } if *attempts > 1 => {
            info!(attempts, "{position} Downloaded {} after retries", report.label);
        }
        RecordOutcome::Succeeded { .. } => info!("{position} Downloaded {}", report.label),
        RecordOutcome::Skipped { .. } => info!("{position} Skipped {} (already exists)", report.label),
        RecordOutcome::Failed { error, .. } => {
            warn!("{position} Failed {}: {error}", report.label);
        }
    }
}

pub(crate) fn summary_line(stats: &BatchStats) -> String {
    format!(
        "Complete! Success: {}, Skipped: {}, Failed: {}",
        stats.succeeded, stats.skipped, stats.failed
    )
}

/// Absolute form of `output_dir` for display; falls back to the path as given.
pub(crate) fn display_output_dir(output_dir: &Path) -> PathBuf {
    std::path::absolute(output_dir).unwrap_or_else(|_| output_dir.to_path_buf())
}

/// Prints the run summary to stdout and lists failed records.
pub(crate) fn print_completion_summary(report: &BatchReport, output_dir: &Path) {
    let stats = &report.stats;
    info!(
        succeeded = stats.succeeded,
        skipped = stats.skipped,
        failed = stats.failed,
        retried = stats.retried,
        "Download Summary"
    );

    println!("{}", summary_line(stats));
    println!("Images saved to: {}", display_output_dir(output_dir).display());

    for line in failure_lines(report) {
        println!("{line}");
    }
}

pub(crate) fn failure_lines(report: &BatchReport) -> Vec<String> {
    report
        .records
        .iter()
        .filter_map(|record| match &record.outcome {
            RecordOutcome::Failed { error, .. } => {
                Some(format!("  {} {}: {error}", record.label, record.coordinate))
            }
            _ => None,
        })
        .collect()
}

/// Writes the full batch report as pretty JSON.
pub(crate) fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write run report: {}", path.display()))?;
    info!(path = %path.display(), "Run report written");
    Ok(())
}
