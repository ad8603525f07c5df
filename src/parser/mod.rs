//! Input parsing for coordinate lists.
//!
//! Reads a CSV file with a header row containing at least `lat`, `lon` and
//! `label` columns. Extra columns are ignored and fields are trimmed.
//!
//! # Example
//!
//! ```
//! use imagery_core::parser::parse_coordinates;
//!
//! let csv = "lat,lon,label\n-37.8136,144.9631,crossing_001\n";
//! let records = parse_coordinates(csv.as_bytes()).unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].label, "crossing_001");
//! ```

mod error;
mod input;

pub use error::{InputError, REQUIRED_COLUMNS};
pub use input::LabeledCoordinate;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, instrument};

/// Reads every record of a coordinates CSV file, in file order.
///
/// # Errors
///
/// Returns [`InputError::Io`] if the file cannot be opened, and the errors of
/// [`parse_coordinates`] for malformed content.
#[instrument(skip(path), fields(path = %path.display()))]
pub fn read_coordinates(path: &Path) -> Result<Vec<LabeledCoordinate>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_coordinates(file)?;
    info!(records = records.len(), "loaded coordinates");
    Ok(records)
}

/// Parses coordinate records from any CSV reader.
///
/// # Errors
///
/// - [`InputError::MissingColumn`] if the header lacks `lat`, `lon` or `label`
/// - [`InputError::InvalidRecord`] for a row whose `lat`/`lon` is not a finite
///   number or that has too few fields
/// - [`InputError::Csv`] for failures without a row position
pub fn parse_coordinates<R: Read>(reader: R) -> Result<Vec<LabeledCoordinate>, InputError> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(InputError::MissingColumn { column });
        }
    }

    let mut records = Vec::new();
    let mut row = StringRecord::new();
    while csv_reader.read_record(&mut row).map_err(from_csv_error)? {
        let line = row.position().map_or(0, csv::Position::line);
        let record: LabeledCoordinate = row
            .deserialize(Some(&headers))
            .map_err(|e| InputError::invalid_record(line, deserialize_reason(&e)))?;

        if !record.lat.is_finite() || !record.lon.is_finite() {
            return Err(InputError::invalid_record(
                line,
                format!("coordinate ({}, {}) is not finite", record.lat, record.lon),
            ));
        }

        records.push(LabeledCoordinate::new(record.lat, record.lon, record.label));
    }

    debug!(records = records.len(), "parsed coordinates");
    Ok(records)
}

fn from_csv_error(error: csv::Error) -> InputError {
    match error.position() {
        Some(position) => InputError::invalid_record(position.line(), error.to_string()),
        None => InputError::Csv(error),
    }
}

fn deserialize_reason(error: &csv::Error) -> String {
    match error.kind() {
        csv::ErrorKind::Deserialize { err, .. } => match err.field() {
            Some(index) => format!("field {}: {err}", index + 1),
            None => err.to_string(),
        },
        _ => error.to_string(),
    }
}
