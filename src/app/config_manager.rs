//! Configuration lifecycle: load file config, merge CLI overrides, validate.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use imagery_core::{BatchSettings, RetryPolicy};

use crate::app_config::{DownloadConfig, load_config};
use crate::cli::Args;

/// Settings for one run after file config and CLI flags are merged.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub(crate) download: DownloadConfig,
    pub(crate) config_path: Option<PathBuf>,
}

impl ResolvedConfig {
    pub(crate) fn batch_settings(&self) -> BatchSettings {
        BatchSettings::new(
            self.download.zoom,
            self.download.size,
            self.download.output_dir.clone(),
        )
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.download.max_attempts,
            Duration::from_secs_f64(self.download.retry_delay_secs),
        )
        .with_jitter(Duration::from_millis(self.download.retry_jitter_ms))
    }
}

/// Loads the config file (if any), applies CLI overrides and validates the result.
pub(crate) fn resolve_config(args: &Args) -> Result<ResolvedConfig> {
    let loaded = load_config(args.config.as_deref())?;
    let download = apply_cli_overrides(loaded.config.download, args);
    download.validate()?;
    Ok(ResolvedConfig {
        download,
        config_path: loaded.path,
    })
}

/// CLI flags win over file values.
pub(crate) fn apply_cli_overrides(mut download: DownloadConfig, args: &Args) -> DownloadConfig {
    if let Some(zoom) = args.zoom {
        download.zoom = zoom;
    }
    if let Some(size) = args.size {
        download.size = size;
    }
    if let Some(output_dir) = &args.output_dir {
        download.output_dir.clone_from(output_dir);
    }
    if let Some(max_attempts) = args.max_attempts {
        download.max_attempts = max_attempts;
    }
    if let Some(retry_delay) = args.retry_delay {
        download.retry_delay_secs = retry_delay;
    }
    if let Some(jitter) = args.retry_jitter_ms {
        download.retry_jitter_ms = jitter;
    }
    if let Some(rate) = args.max_failure_rate {
        download.max_failure_rate = rate;
    }
    download
}
