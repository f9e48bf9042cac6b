// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Ride fixtures: a short loop around a park with a few bumps.

use ridestream_core::{FusedRecord, LocationReading, MotionReading, MotionSample};

pub fn location(latitude: f64, longitude: f64, captured_at: u64) -> LocationReading {
    LocationReading::new(latitude, longitude, captured_at)
}

pub fn motion(x: f64, y: f64, z: f64, captured_at: u64) -> MotionSample {
    MotionSample::new(x, y, z, captured_at)
}

/// A motion sample whose magnitude is exactly `magnitude` (all on the z axis).
pub fn bump(magnitude: f64, captured_at: u64) -> MotionSample {
    MotionSample::new(0.0, 0.0, magnitude, captured_at)
}

pub fn park_entrance() -> LocationReading {
    location(52.358_0, 4.868_1, 1_000)
}

pub fn park_pond() -> LocationReading {
    location(52.357_2, 4.865_9, 2_000)
}

pub fn park_exit() -> LocationReading {
    location(52.356_4, 4.863_3, 3_000)
}

pub fn accel_record(captured_at: u64, total_accel: f64) -> FusedRecord {
    FusedRecord::motion(
        MotionReading {
            magnitude: total_accel,
            captured_at,
        },
        None,
    )
}

pub fn accel_record_at(captured_at: u64, total_accel: f64, at: LocationReading) -> FusedRecord {
    FusedRecord::motion(
        MotionReading {
            magnitude: total_accel,
            captured_at,
        },
        Some(at),
    )
}

pub fn location_record(captured_at: u64, latitude: f64, longitude: f64) -> FusedRecord {
    FusedRecord::location_update(location(latitude, longitude, captured_at))
}

/// `count` accel-only records starting at `start`, 20 ms apart.
pub fn accel_burst(start: u64, count: usize) -> Vec<FusedRecord> {
    (0..count)
        .map(|i| accel_record(start + 20 * i as u64, 9.8 + i as f64 / 10.0))
        .collect()
}
