// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Shared data model for ridestream.
//!
//! Readings come from two device sources, are fused into [`FusedRecord`]s,
//! travel as [`Batch`]es inside protocol frames, and end up as one
//! [`ExportArtifact`] per finalized session.

pub mod export;
pub mod protocol;
pub mod reading;
pub mod record;
pub mod session;

/// Capture time in milliseconds.
pub type Timestamp = u64;

pub use self::export::{parse_csv, ExportArtifact, ExportRow, EXPORT_HEADER};
pub use self::protocol::{
    decode_client_frame, encode_data_frame, encode_stop_frame, ClientMessage, ServerMessage,
};
pub use self::reading::{LocationReading, MotionReading, MotionSample};
pub use self::record::{decode_batch, Batch, FusedRecord};
pub use self::session::{RideSummary, SessionIndex};
pub use ridestream_error::{ErrorKind, RideError, Result, ResultExt};
