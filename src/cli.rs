//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download satellite imagery tiles for labeled coordinates.
///
/// Reads a CSV with lat, lon and label columns and stores one tile per row
/// as {label}_{lat}_{lon}_z{zoom}.jpg. Tiles already on disk are skipped, so
/// an interrupted run can simply be restarted. The API key is read from
/// GOOGLE_MAPS_API_KEY.
#[derive(Parser, Debug)]
#[command(name = "imagery-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// CSV file with lat, lon and label columns
    #[arg(value_name = "COORDINATES_CSV")]
    pub input: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Config file (default: config/config.yaml under the nearest ancestor with a config/ dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Zoom level (0-21, 18-20 recommended for ground detail)
    #[arg(short = 'z', long, value_parser = clap::value_parser!(u8).range(0..=21))]
    pub zoom: Option<u8>,

    /// Square image size in pixels (1-640)
    #[arg(short = 's', long, value_parser = clap::value_parser!(u16).range(1..=640))]
    pub size: Option<u16>,

    /// Directory tiles are written to
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum attempts per tile, including the first (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry in seconds; doubles on every further retry
    #[arg(long, value_name = "SECS", allow_negative_numbers = true)]
    pub retry_delay: Option<f64>,

    /// Random jitter added to each retry delay, in milliseconds (0 to disable)
    #[arg(long, value_name = "MS")]
    pub retry_jitter_ms: Option<u64>,

    /// Exit with code 3 when the fraction of failed downloads exceeds this (0.0-1.0)
    #[arg(long, value_name = "RATE", allow_negative_numbers = true)]
    pub max_failure_rate: Option<f64>,

    /// Show which tiles would be downloaded or skipped, without network access
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON report of every record's outcome to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Override the imagery provider endpoint
    #[arg(long, hide = true)]
    pub endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_args_parses_with_missing_input() {
        let args = Args::try_parse_from(["imagery-downloader"]).unwrap();
        assert!(args.input.is_none());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.dry_run);
        assert!(args.zoom.is_none());
    }

    #[test]
    fn test_cli_positional_input() {
        let args = Args::try_parse_from(["imagery-downloader", "data/coordinates.csv"]).unwrap();
        assert_eq!(args.input, Some(PathBuf::from("data/coordinates.csv")));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["imagery-downloader", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["imagery-downloader", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["imagery-downloader", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_download_overrides() {
        let args = Args::try_parse_from([
            "imagery-downloader",
            "coords.csv",
            "-z",
            "19",
            "-s",
            "512",
            "-o",
            "tiles",
            "-r",
            "5",
            "--retry-delay",
            "0.5",
            "--max-failure-rate",
            "0.25",
        ])
        .unwrap();
        assert_eq!(args.zoom, Some(19));
        assert_eq!(args.size, Some(512));
        assert_eq!(args.output_dir, Some(PathBuf::from("tiles")));
        assert_eq!(args.max_attempts, Some(5));
        assert_eq!(args.retry_delay, Some(0.5));
        assert_eq!(args.max_failure_rate, Some(0.25));
    }

    #[test]
    fn test_cli_zoom_over_max_rejected() {
        let err = Args::try_parse_from(["imagery-downloader", "-z", "22"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_size_over_provider_limit_rejected() {
        let err = Args::try_parse_from(["imagery-downloader", "-s", "641"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_max_attempts_zero_rejected() {
        let err = Args::try_parse_from(["imagery-downloader", "-r", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_negative_numbers_reach_config_validation() {
        let args = Args::try_parse_from([
            "imagery-downloader",
            "coords.csv",
            "--retry-delay",
            "-2",
            "--max-failure-rate",
            "-0.5",
        ])
        .unwrap();
        assert_eq!(args.retry_delay, Some(-2.0));
        assert_eq!(args.max_failure_rate, Some(-0.5));
        assert_eq!(args.input, Some(PathBuf::from("coords.csv")));
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["imagery-downloader", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
