//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use imagery_core::download::constants::{
    DEFAULT_IMAGE_SIZE, DEFAULT_OUTPUT_DIR, DEFAULT_ZOOM, MAX_IMAGE_SIZE,
};
use imagery_core::download::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS};
use serde::Deserialize;
use tracing::debug;

/// Directory whose presence marks the project root.
pub(crate) const CONFIG_DIR_NAME: &str = "config";

/// File read from the config directory.
pub(crate) const CONFIG_FILE_NAME: &str = "config.yaml";

const MAX_ZOOM: u8 = 21;
const MAX_ATTEMPTS_LIMIT: u32 = 10;
const MAX_RETRY_DELAY_SECS: f64 = 300.0;

/// YAML-backed file configuration.
///
/// Download settings are read from a top-level `download:` section or from
/// `data.download:`. Setting both is an error. Other sections are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FileConfig {
    pub(crate) download: DownloadConfig,
}

/// Document shape as written on disk, before the two layouts are merged.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFileConfig {
    download: Option<DownloadConfig>,
    data: Option<DataSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DataSection {
    download: Option<DownloadConfig>,
}

impl RawFileConfig {
    fn into_file_config(self) -> Result<FileConfig> {
        let nested = self.data.and_then(|data| data.download);
        let download = match (self.download, nested) {
            (Some(_), Some(_)) => bail!(
                "Config sets both `download` and `data.download`; keep only one of them"
            ),
            (Some(download), None) => download,
            (None, Some(download)) => {
                debug!("Reading download settings from `data.download`");
                download
            }
            (None, None) => DownloadConfig::default(),
        };
        Ok(FileConfig { download })
    }
}

/// Settings under the `download:` (or `data.download:`) key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct DownloadConfig {
    /// Zoom level for every tile.
    pub(crate) zoom: u8,
    /// Square image size in pixels.
    pub(crate) size: u16,
    /// Directory tiles are written to.
    pub(crate) output_dir: PathBuf,
    /// Attempts per tile, including the first.
    pub(crate) max_attempts: u32,
    /// Delay before the first retry, in seconds.
    pub(crate) retry_delay_secs: f64,
    /// Upper bound of random jitter added to each retry delay.
    pub(crate) retry_jitter_ms: u64,
    /// Failure rate above which the process exits with code 3.
    pub(crate) max_failure_rate: f64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            size: DEFAULT_IMAGE_SIZE,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: DEFAULT_INITIAL_DELAY.as_secs_f64(),
            retry_jitter_ms: 0,
            max_failure_rate: 1.0,
        }
    }
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub(crate) fn validate(&self) -> Result<()> {
        self.download.validate()
    }
}

impl DownloadConfig {
    /// Validates every field; CLI overrides go through the same checks.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.zoom > MAX_ZOOM {
            bail!(
                "Invalid config value for `zoom`: {}. Expected range: 0..={MAX_ZOOM}",
                self.zoom
            );
        }
        if !(1..=MAX_IMAGE_SIZE).contains(&self.size) {
            bail!(
                "Invalid config value for `size`: {}. Expected range: 1..={MAX_IMAGE_SIZE}",
                self.size
            );
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            bail!(
                "Invalid config value for `max_attempts`: {}. Expected range: 1..={MAX_ATTEMPTS_LIMIT}",
                self.max_attempts
            );
        }
        if !self.retry_delay_secs.is_finite()
            || !(0.0..=MAX_RETRY_DELAY_SECS).contains(&self.retry_delay_secs)
        {
            bail!(
                "Invalid config value for `retry_delay_secs`: {}. Expected range: 0..={MAX_RETRY_DELAY_SECS}",
                self.retry_delay_secs
            );
        }
        if !self.max_failure_rate.is_finite() || !(0.0..=1.0).contains(&self.max_failure_rate) {
            bail!(
                "Invalid config value for `max_failure_rate`: {}. Expected range: 0.0..=1.0",
                self.max_failure_rate
            );
        }
        if self.output_dir.as_os_str().is_empty() {
            bail!("Invalid config value for `output_dir`: must not be empty");
        }
        Ok(())
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone)]
pub(crate) struct LoadedConfig {
    /// Path the config was read from, if any.
    pub(crate) path: Option<PathBuf>,
    /// Parsed config, or built-in defaults.
    pub(crate) config: FileConfig,
}

impl LoadedConfig {
    fn defaults() -> Self {
        Self {
            path: None,
            config: FileConfig::default(),
        }
    }
}

/// Returns the first of `start` and its ancestors that contains a `config/` directory.
#[must_use]
pub(crate) fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_DIR_NAME).is_dir())
        .map(Path::to_path_buf)
}

/// Resolves the config path for a run.
///
/// Priority:
/// 1. `explicit` (`--config`), which must exist
/// 2. `<root>/config/config.yaml` for the nearest ancestor of `cwd` with a `config/` dir
///
/// Returns `None` when neither applies, meaning built-in defaults.
pub(crate) fn resolve_config_path(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let Some(root) = find_project_root(cwd) else {
        return Ok(None);
    };
    let path = root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
    if !path.is_file() {
        bail!(
            "Config file not found: {} (project root {} has a {CONFIG_DIR_NAME}/ directory)",
            path.display(),
            root.display()
        );
    }
    Ok(Some(path))
}

/// Loads config for the current working directory, honoring `--config`.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let cwd = env::current_dir().context("Failed to read current directory")?;
    load_config_from(explicit, &cwd)
}

/// Loads config as [`load_config`] would when run from `cwd`.
pub(crate) fn load_config_from(explicit: Option<&Path>, cwd: &Path) -> Result<LoadedConfig> {
    let Some(path) = resolve_config_path(explicit, cwd)? else {
        debug!("No project config found, using built-in defaults");
        return Ok(LoadedConfig::defaults());
    };

    let config = load_file_config(&path)?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(LoadedConfig {
        path: Some(path),
        config,
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse_file_config(&raw)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

/// Parses and validates YAML config text. An empty document yields defaults.
pub(crate) fn parse_file_config(raw: &str) -> Result<FileConfig> {
    if raw.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    let raw: RawFileConfig = serde_yaml::from_str(raw).context("Failed to parse YAML")?;
    let config = raw.into_file_config()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(root: &Path, contents: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR_NAME);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_parse_file_config_reads_download_section() {
        let raw = "\
data:
  raw_dir: ignored
download:
  zoom: 19
  size: 512
  output_dir: tiles
  max_attempts: 5
  retry_delay_secs: 0.5
";
        let config = parse_file_config(raw).unwrap();
        assert_eq!(config.download.zoom, 19);
        assert_eq!(config.download.size, 512);
        assert_eq!(config.download.output_dir, PathBuf::from("tiles"));
        assert_eq!(config.download.max_attempts, 5);
        assert!((config.download.retry_delay_secs - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.download.retry_jitter_ms, 0);
    }

    #[test]
    fn test_parse_file_config_reads_nested_data_download_section() {
        let raw = "\
data:
  raw_dir: data/raw
  download:
    zoom: 18
    output_dir: tiles
";
        let config = parse_file_config(raw).unwrap();
        assert_eq!(config.download.zoom, 18);
        assert_eq!(config.download.output_dir, PathBuf::from("tiles"));
        assert_eq!(config.download.size, 640);
    }

    #[test]
    fn test_parse_file_config_nested_section_is_validated() {
        let err = parse_file_config("data:\n  download:\n    size: 4096\n").unwrap_err();
        assert!(err.to_string().contains("size"), "error: {err}");
    }

    #[test]
    fn test_parse_file_config_rejects_both_download_layouts() {
        let raw = "download:\n  zoom: 19\ndata:\n  download:\n    zoom: 18\n";
        let err = parse_file_config(raw).unwrap_err();
        assert!(err.to_string().contains("data.download"), "error: {err}");
    }

    #[test]
    fn test_parse_file_config_data_without_download_uses_defaults() {
        let config = parse_file_config("data:\n  raw_dir: data/raw\n").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_parse_file_config_missing_keys_use_defaults() {
        let config = parse_file_config("download:\n  zoom: 18\n").unwrap();
        assert_eq!(config.download.zoom, 18);
        assert_eq!(config.download.size, 640);
        assert_eq!(config.download.output_dir, PathBuf::from("data/raw"));
        assert_eq!(config.download.max_attempts, 3);
        assert!((config.download.retry_delay_secs - 1.0).abs() < f64::EPSILON);
        assert!((config.download.max_failure_rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_file_config_empty_document_is_default() {
        assert_eq!(parse_file_config("  \n").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_parse_file_config_rejects_out_of_range_zoom() {
        let err = parse_file_config("download:\n  zoom: 25\n").unwrap_err();
        assert!(err.to_string().contains("zoom"), "error: {err}");
    }

    #[test]
    fn test_parse_file_config_rejects_oversized_image() {
        let err = parse_file_config("download:\n  size: 1024\n").unwrap_err();
        assert!(err.to_string().contains("size"), "error: {err}");
    }

    #[test]
    fn test_parse_file_config_rejects_negative_retry_delay() {
        let err = parse_file_config("download:\n  retry_delay_secs: -1.0\n").unwrap_err();
        assert!(err.to_string().contains("retry_delay_secs"), "error: {err}");
    }

    #[test]
    fn test_parse_file_config_rejects_failure_rate_above_one() {
        let err = parse_file_config("download:\n  max_failure_rate: 1.5\n").unwrap_err();
        assert!(err.to_string().contains("max_failure_rate"), "error: {err}");
    }

    #[test]
    fn test_parse_file_config_rejects_wrong_type() {
        assert!(parse_file_config("download:\n  zoom: high\n").is_err());
    }

    #[test]
    fn test_find_project_root_walks_up_to_config_dir() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "download: {}\n");
        let nested = temp.path().join("notebooks").join("deep");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_project_root(&nested), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn test_load_config_from_nested_directory_reads_project_file() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "download:\n  zoom: 17\n");
        let nested = temp.path().join("scripts");
        fs::create_dir_all(&nested).unwrap();

        let loaded = load_config_from(None, &nested).unwrap();
        assert!(loaded.path.is_some());
        assert_eq!(loaded.config.download.zoom, 17);
    }

    #[test]
    fn test_load_config_config_dir_without_file_is_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(CONFIG_DIR_NAME)).unwrap();

        let err = load_config_from(None, temp.path()).unwrap_err();
        assert!(err.to_string().contains("Config file not found"), "error: {err}");
    }

    #[test]
    fn test_load_config_explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        let err = load_config_from(Some(&missing), temp.path()).unwrap_err();
        assert!(err.to_string().contains("Config file not found"), "error: {err}");
    }

    #[test]
    fn test_load_config_explicit_path_wins_over_project_file() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "download:\n  zoom: 17\n");
        let explicit = temp.path().join("other.yaml");
        fs::write(&explicit, "download:\n  zoom: 15\n").unwrap();

        let loaded = load_config_from(Some(&explicit), temp.path()).unwrap();
        assert_eq!(loaded.path, Some(explicit));
        assert_eq!(loaded.config.download.zoom, 15);
    }
}
