// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{LocationReading, MotionReading, Timestamp};
use ridestream_error::{RideError, Result};
use serde::{Deserialize, Serialize};

/// One entry of the fused stream.
///
/// At least one of `location` and `total_accel` is present. A record with
/// `total_accel` carries the last location known when the motion event
/// arrived, which may be older than `captured_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedRecord {
    #[serde(alias = "timestamp")]
    pub captured_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_accel: Option<f64>,
}

/// Unit of transmission: buffered records in arrival order.
pub type Batch = Vec<FusedRecord>;

impl FusedRecord {
    /// A pure location update.
    #[must_use]
    pub const fn location_update(location: LocationReading) -> Self {
        Self {
            captured_at: location.captured_at,
            location: Some(location),
            total_accel: None,
        }
    }

    /// A motion record carrying `last_known` forward unchanged.
    #[must_use]
    pub const fn motion(reading: MotionReading, last_known: Option<LocationReading>) -> Self {
        Self {
            captured_at: reading.captured_at,
            location: last_known,
            total_accel: Some(reading.magnitude),
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.location.is_some() || self.total_accel.is_some()
    }

    /// `false` if a coordinate or the acceleration is NaN or infinite.
    ///
    /// JSON has no encoding for such values, so they must never be sent.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.location
            .is_none_or(|l| l.latitude.is_finite() && l.longitude.is_finite())
            && self.total_accel.is_none_or(f64::is_finite)
    }
}

/// Decode a batch from an already-parsed JSON body.
///
/// The whole batch is rejected if the body is not an array or any element is
/// not a valid fused record.
///
/// # Errors
/// Returns [`RideError::InvalidPayload`] describing the first offending element.
pub fn decode_batch(body: &serde_json::Value) -> Result<Batch> {
    let items = body
        .as_array()
        .ok_or_else(|| RideError::invalid_payload("expected a JSON array of records"))?;

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let record = FusedRecord::deserialize(item).map_err(|e| {
                RideError::invalid_payload(format!("record {position}: {e}"))
            })?;
            if record.is_valid() {
                Ok(record)
            } else {
                Err(RideError::invalid_payload(format!(
                    "record {position}: neither location nor totalAccel present"
                )))
            }
        })
        .collect()
}
