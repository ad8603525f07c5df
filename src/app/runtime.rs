//! Top-level run flow: arguments, config, input, then the batch.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use imagery_core::{ApiKey, BatchRunner, RetryingDownloader, StaticMapClient, read_coordinates};
use tracing::{debug, info};

use crate::ProcessExit;
use crate::app::progress_manager::BatchProgress;
use crate::app::{config_manager, exit_handler, output, terminal};
use crate::cli::Args;
use crate::commands;

pub(crate) async fn run_downloader() -> Result<ProcessExit> {
    let args = Args::parse();

    terminal::init_tracing(&terminal::resolve_default_log_level(args.verbose, args.quiet));
    debug!(?args, "CLI arguments parsed");

    let Some(input) = args.input.as_deref() else {
        eprintln!("{}", Args::command().render_usage());
        eprintln!("error: missing required argument <COORDINATES_CSV>");
        return Ok(ProcessExit::Usage);
    };

    let resolved = config_manager::resolve_config(&args)?;
    match &resolved.config_path {
        Some(path) => info!(config = %path.display(), "Using config file"),
        None => debug!("Using built-in defaults"),
    }

    let records = read_coordinates(input)
        .with_context(|| format!("Failed to load coordinates from {}", input.display()))?;
    let settings = resolved.batch_settings();

    if args.dry_run {
        commands::run_dry_run_preview(&settings, &records).await;
        return Ok(ProcessExit::Success);
    }

    let credential = ApiKey::from_env().context("Cannot download imagery without an API key")?;
    let client = match args.endpoint.as_deref() {
        Some(endpoint) => StaticMapClient::with_endpoint(endpoint)?,
        None => StaticMapClient::new(),
    };
    let runner = BatchRunner::new(
        RetryingDownloader::new(client, resolved.retry_policy()),
        credential,
        settings,
    );

    info!(
        records = records.len(),
        zoom = resolved.download.zoom,
        size = resolved.download.size,
        "Downloader starting"
    );

    let use_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let progress = BatchProgress::new(use_bar, records.len());
    let report = runner
        .run_with_progress(&records, |record| progress.on_record(record))
        .await;
    progress.finish();

    if !args.quiet {
        output::print_completion_summary(&report, &runner.settings().output_dir);
    }
    if let Some(path) = args.report.as_deref() {
        output::write_report(&report, path)?;
    }

    Ok(exit_handler::determine_exit_outcome(
        &report.stats,
        resolved.download.max_failure_rate,
    ))
}
