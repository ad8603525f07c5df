//! Progress UI (bar) for batch runs.

use std::time::Duration;

use imagery_core::RecordOutcome;
use imagery_core::download::RecordReport;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app::output;

/// Progress reporting for a batch. Without a bar, record lines go straight to the log.
pub(crate) struct BatchProgress {
    bar: Option<ProgressBar>,
}

impl BatchProgress {
    pub(crate) fn new(use_bar: bool, total: usize) -> Self {
        if !use_bar || total == 0 {
            return Self { bar: None };
        }
        let bar = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {bar:30} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    /// Records one finished record.
    pub(crate) fn on_record(&self, report: &RecordReport) {
        let Some(bar) = &self.bar else {
            output::log_record(report);
            return;
        };
        bar.suspend(|| output::log_record(report));
        bar.set_message(status_message(report));
        bar.inc(1);
    }

    pub(crate) fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn status_message(report: &RecordReport) -> String {
    let verb = match report.outcome {
        RecordOutcome::Succeeded { .. } => "downloaded",
        RecordOutcome::Skipped { .. } => "skipped",
        RecordOutcome::Failed { .. } => "failed",
    };
    format!("{} {verb}", report.label)
}
