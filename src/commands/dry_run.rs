//! Dry-run command flow for previewing which tiles a run would fetch.

use imagery_core::download::{PlannedRecord, plan_batch};
use imagery_core::{BatchSettings, LabeledCoordinate};
use tracing::info;

/// Prints one line per record plus totals. Needs neither network nor credential.
pub async fn run_dry_run_preview(settings: &BatchSettings, records: &[LabeledCoordinate]) {
    let planned = plan_batch(settings, records).await;
    let (skip, download): (Vec<&PlannedRecord>, Vec<&PlannedRecord>) =
        planned.iter().partition(|record| record.exists);

    info!(
        records = planned.len(),
        would_download = download.len(),
        would_skip = skip.len(),
        zoom = settings.zoom,
        "Planned batch (dry run)"
    );

    println!(
        "Dry run preview: {} record(s), zoom {}, size {}x{}, output {}",
        planned.len(),
        settings.zoom,
        settings.size,
        settings.size,
        settings.output_dir.display()
    );
    for line in preview_lines(&planned) {
        println!("{line}");
    }
    println!(
        "Dry run summary: {} to download, {} already present.",
        download.len(),
        skip.len()
    );
    println!("Dry run - no files downloaded");
}

fn preview_lines(planned: &[PlannedRecord]) -> Vec<String> {
    planned
        .iter()
        .map(|record| {
            let tag = if record.exists { "skip" } else { "download" };
            format!("- [{tag}] {} -> {}", record.label, record.path.display())
        })
        .collect()
}
