//! Atomic tile persistence.
//!
//! Bytes land in a temporary file next to the destination and are renamed into
//! place only once fully written and synced, so an interrupted run never
//! leaves a truncated tile under its final name.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::DownloadError;

/// Writes `bytes` to `destination` atomically, creating parent directories.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if the directory cannot be created or any
/// step of the temp-write-rename sequence fails.
pub(crate) async fn write_atomically(
    destination: &Path,
    bytes: Vec<u8>,
) -> Result<PathBuf, DownloadError> {
    let destination = destination.to_path_buf();
    let parent = parent_dir(&destination);

    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(|e| DownloadError::io(parent.clone(), e))?;

    let target = destination.clone();
    tokio::task::spawn_blocking(move || persist_blocking(&parent, &target, &bytes))
        .await
        .map_err(|e| DownloadError::io(destination.clone(), std::io::Error::other(e)))??;

    debug!(path = %destination.display(), "tile persisted");
    Ok(destination)
}

fn persist_blocking(parent: &Path, destination: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    let io_err = |e: std::io::Error| DownloadError::io(destination.to_path_buf(), e);

    let mut temp_file = NamedTempFile::new_in(parent).map_err(io_err)?;
    temp_file.write_all(bytes).map_err(io_err)?;
    temp_file.flush().map_err(io_err)?;
    temp_file.as_file().sync_all().map_err(io_err)?;
    // On failure the temp file is dropped and removed with the PersistError.
    temp_file
        .persist(destination)
        .map_err(|e| io_err(e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
