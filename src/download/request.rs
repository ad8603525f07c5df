//! Request types: a coordinate plus everything needed to fetch one tile.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::constants::MAX_IMAGE_SIZE;

/// A latitude/longitude pair in signed degrees.
///
/// No range validation is performed; values go to the provider as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Formats the coordinate as the provider's `center` parameter.
    ///
    /// Full precision, no rounding: `f64`'s `Display` never switches to
    /// exponent notation, so `-37.8136` stays `-37.8136`.
    #[must_use]
    pub fn center_param(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// One tile download: where, how detailed, how large, and where to store it.
///
/// Built fresh per record and consumed once.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    coordinate: Coordinate,
    zoom: u8,
    size: u16,
    destination: PathBuf,
}

impl DownloadRequest {
    /// Creates a request.
    ///
    /// `size` is clamped into `1..=MAX_IMAGE_SIZE`; the provider rejects
    /// anything larger on the standard tier.
    #[must_use]
    pub fn new(
        coordinate: Coordinate,
        zoom: u8,
        size: u16,
        destination: impl Into<PathBuf>,
    ) -> Self {
        let clamped = size.clamp(1, MAX_IMAGE_SIZE);
        if clamped != size {
            warn!(requested = size, used = clamped, "image size clamped to provider limit");
        }
        Self {
            coordinate,
            zoom,
            size: clamped,
            destination: destination.into(),
        }
    }

    /// The tile center.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Zoom level.
    #[must_use]
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Square tile edge in pixels.
    #[must_use]
    pub fn size(&self) -> u16 {
        self.size
    }

    /// The provider's `size` parameter, e.g. `640x640`.
    #[must_use]
    pub fn size_param(&self) -> String {
        format!("{0}x{0}", self.size)
    }

    /// Where the tile is written.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }
}
