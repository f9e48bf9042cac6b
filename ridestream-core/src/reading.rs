// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Raw, source-specific readings.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// One geolocation fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReading {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
    #[serde(default)]
    pub captured_at: Timestamp,
}

impl LocationReading {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, captured_at: Timestamp) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
        }
    }
}

/// One raw 3-axis accelerometer event as delivered by the device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub captured_at: Timestamp,
}

impl MotionSample {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64, captured_at: Timestamp) -> Self {
        Self { x, y, z, captured_at }
    }

    /// Euclidean norm of the three axes, without intermediate overflow.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }
}

/// Motion reduced to its total acceleration.
///
/// `magnitude` is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionReading {
    pub magnitude: f64,
    pub captured_at: Timestamp,
}

impl From<MotionSample> for MotionReading {
    fn from(sample: MotionSample) -> Self {
        Self {
            magnitude: sample.magnitude(),
            captured_at: sample.captured_at,
        }
    }
}
