// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Fixed four-column CSV export of a finished ride.
//!
//! ```text
//! timestamp,latitude,longitude,total_accel
//! 100,,,1
//! 150,1,2,
//! ```
//!
//! Absent fields are written as empty strings. Numbers use Rust's shortest
//! round-trip decimal form, so `1.0` is written as `1`.

use crate::{FusedRecord, SessionIndex};
use ridestream_error::{RideError, Result};
use serde::{Deserialize, Serialize};

/// Header row, in column order.
pub const EXPORT_HEADER: [&str; 4] = ["timestamp", "latitude", "longitude", "total_accel"];

/// One data row, every column already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub timestamp: String,
    pub latitude: String,
    pub longitude: String,
    pub total_accel: String,
}

fn render(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl From<&FusedRecord> for ExportRow {
    fn from(record: &FusedRecord) -> Self {
        Self {
            timestamp: record.captured_at.to_string(),
            latitude: render(record.location.map(|l| l.latitude)),
            longitude: render(record.location.map(|l| l.longitude)),
            total_accel: render(record.total_accel),
        }
    }
}

/// The immutable export of one finalized session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub session_index: SessionIndex,
    pub rows: Vec<ExportRow>,
}

impl ExportArtifact {
    #[must_use]
    pub fn from_records(session_index: SessionIndex, records: &[FusedRecord]) -> Self {
        Self {
            session_index,
            rows: records.iter().map(ExportRow::from).collect(),
        }
    }

    /// Render header and rows as CSV bytes.
    ///
    /// # Errors
    /// Returns [`RideError::StorageWriteFailure`] if encoding fails.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer
            .write_record(EXPORT_HEADER)
            .map_err(|e| RideError::storage_caused_by("writing csv header", e))?;
        for row in &self.rows {
            writer
                .serialize(row)
                .map_err(|e| RideError::storage_caused_by("writing csv row", e))?;
        }

        writer
            .into_inner()
            .map_err(|e| RideError::storage(format!("flushing csv: {e}")))
    }
}

/// Parse CSV bytes produced by [`ExportArtifact::to_csv`].
///
/// # Errors
/// Returns [`RideError::InvalidPayload`] if the header does not match
/// [`EXPORT_HEADER`] or a row is malformed.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<ExportRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let header = reader
        .headers()
        .map_err(|e| RideError::invalid_payload(format!("reading csv header: {e}")))?;
    if header.iter().ne(EXPORT_HEADER) {
        return Err(RideError::invalid_payload(format!(
            "unexpected csv header: {header:?}"
        )));
    }

    reader
        .deserialize()
        .map(|row| row.map_err(|e| RideError::invalid_payload(format!("reading csv row: {e}"))))
        .collect()
}
