//! Types representing parsed coordinate records.

use serde::{Deserialize, Serialize};

use crate::download::Coordinate;

/// One row of the coordinates file: where to look and what it shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledCoordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Dataset label, used as the filename prefix.
    pub label: String,
}

impl LabeledCoordinate {
    /// Creates a record, trimming the label.
    #[must_use]
    pub fn new(lat: f64, lon: f64, label: impl Into<String>) -> Self {
        let label: String = label.into();
        Self {
            lat,
            lon,
            label: label.trim().to_string(),
        }
    }

    /// The record's coordinate.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}
