// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Ridestream
//!
//! Records a ride on the device and turns it into a downloadable CSV on the
//! collection service.
//!
//! ## Overview
//!
//! - **Fusion**: geolocation (~1 Hz) and accelerometer (~50 Hz) readings are
//!   merged by arrival into one stream of [`FusedRecord`]s. Motion records
//!   carry the last known location forward; nothing is interpolated or
//!   reordered by capture time.
//! - **Delivery**: the [`BatchSender`] flushes the buffered records every
//!   30 seconds as one `data` frame over a persistent [`Connection`], and a
//!   final flush plus `stop` ends the ride.
//! - **Collection**: the [`Service`] appends batches to the open session and,
//!   on stop, writes `ride_<n>.csv` with the columns
//!   `timestamp,latitude,longitude,total_accel`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ridestream::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> ridestream::Result<()> {
//!     let service = Service::in_memory();
//!     let (client, server) = duplex();
//!     tokio::spawn(serve_connection(service.clone(), server));
//!
//!     let gps = ChannelSource::<LocationReading>::new();
//!     let imu = ChannelSource::<MotionSample>::new();
//!     let mut recorder = RideRecorder::start(&gps, &imu, Arc::new(client), SenderConfig::default());
//!
//!     // Device callbacks push readings as they arrive.
//!     gps.push(LocationReading::new(52.35, 4.86, 1_000));
//!     imu.push(MotionSample { x: 0.1, y: 0.2, z: 9.8, captured_at: 1_020 });
//!
//!     let receipt = recorder.stop().await?;
//!     println!("saved ride {} at {}", receipt.index, receipt.download_url);
//!     Ok(())
//! }
//! ```

pub use ridestream_core::{
    ExportArtifact, ExportRow, FusedRecord, LocationReading, MotionReading, MotionSample,
    RideError, RideSummary, Result, SessionIndex, Timestamp,
};
pub use ridestream_fuse::{ChannelSource, RecordBuffer, SampleSource, StreamFuser, Subscription};
pub use ridestream_sender::{
    duplex, BatchSender, ClientConnection, Connection, RideRecorder, SenderConfig,
    ServerConnection, StopReceipt,
};
pub use ridestream_service::{
    endpoints, serve_connection, serve_observer, ExportStore, FinalizedSession, FsExportStore,
    MemoryExportStore, Service, ServiceConfig,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use ridestream_core::{FusedRecord, LocationReading, MotionSample, RideError};
    pub use ridestream_fuse::{ChannelSource, SampleSource};
    pub use ridestream_sender::{duplex, Connection, RideRecorder, SenderConfig};
    pub use ridestream_service::{serve_connection, Service, ServiceConfig};
}
