//! Deterministic output filenames for labeled coordinates.
//!
//! The name encodes label, coordinate and zoom so a rerun maps every record to
//! the same file, which is what makes skip-if-exists work.

use std::path::{Path, PathBuf};

use super::request::Coordinate;

/// Extension of stored tiles.
pub const TILE_EXTENSION: &str = "jpg";

/// Builds `{label}_{lat:.6}_{lon:.6}_z{zoom}.jpg`.
///
/// The label is trimmed and sanitized with [`sanitize_label`].
///
/// # Example
///
/// ```
/// use imagery_core::download::{Coordinate, tile_filename};
///
/// let name = tile_filename("crossing_001", Coordinate::new(-37.8136, 144.9631), 19);
/// assert_eq!(name, "crossing_001_-37.813600_144.963100_z19.jpg");
/// ```
#[must_use]
pub fn tile_filename(label: &str, coordinate: Coordinate, zoom: u8) -> String {
    format!(
        "{}_{:.6}_{:.6}_z{zoom}.{TILE_EXTENSION}",
        sanitize_label(label),
        coordinate.lat,
        coordinate.lon
    )
}

/// Joins [`tile_filename`] onto `output_dir`.
#[must_use]
pub fn tile_path(output_dir: &Path, label: &str, coordinate: Coordinate, zoom: u8) -> PathBuf {
    output_dir.join(tile_filename(label, coordinate, zoom))
}

/// Trims a label and replaces path separators and control characters with `_`.
///
/// Keeps every record inside the output directory; ordinary labels are
/// returned unchanged apart from trimming.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_filename_matches_reference_scenario() {
        let name = tile_filename("crossing_001", Coordinate::new(-37.8136, 144.9631), 19);
        assert_eq!(name, "crossing_001_-37.813600_144.963100_z19.jpg");
    }

    #[test]
    fn test_tile_filename_rounds_to_six_decimals() {
        let name = tile_filename("a", Coordinate::new(1.123_456_789, -0.123_456_7), 20);
        assert_eq!(name, "a_1.123457_-0.123457_z20.jpg");
    }

    #[test]
    fn test_tile_filename_trims_label() {
        let name = tile_filename("  crossing_002 ", Coordinate::new(0.0, 0.0), 18);
        assert_eq!(name, "crossing_002_0.000000_0.000000_z18.jpg");
    }

    #[test]
    fn test_sanitize_label_replaces_path_separators() {
        assert_eq!(sanitize_label("../escape"), ".._escape");
        assert_eq!(sanitize_label("a\\b"), "a_b");
        assert_eq!(sanitize_label("tab\there"), "tab_here");
    }

    #[test]
    fn test_sanitize_label_keeps_ordinary_characters() {
        assert_eq!(sanitize_label("road-marking 7 (north)"), "road-marking 7 (north)");
        assert_eq!(sanitize_label("zebra_übergang"), "zebra_übergang");
    }

    #[test]
    fn test_tile_path_joins_output_dir() {
        let path = tile_path(
            Path::new("data/raw"),
            "crossing_001",
            Coordinate::new(-37.8136, 144.9631),
            19,
        );
        assert_eq!(
            path,
            PathBuf::from("data/raw/crossing_001_-37.813600_144.963100_z19.jpg")
        );
    }
}
