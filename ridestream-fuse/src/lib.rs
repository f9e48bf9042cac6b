// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Fusion of the location and motion sources into one record stream.
//!
//! The two sources run at unrelated rates (about 1 Hz and 50 Hz) and are
//! never synchronized. Records are appended in arrival order; each motion
//! record carries the most recent location forward.
//!
//! ```rust
//! use ridestream_core::{LocationReading, MotionSample};
//! use ridestream_fuse::StreamFuser;
//!
//! let fuser = StreamFuser::new();
//! fuser.on_motion(MotionSample::new(0.0, 0.0, 1.0, 100));
//! fuser.on_location(LocationReading::new(1.0, 2.0, 150));
//! fuser.on_motion(MotionSample::new(3.0, 4.0, 0.0, 140));
//!
//! let records = fuser.buffer().take();
//! assert_eq!(records[0].location, None);
//! assert_eq!(records[2].location, Some(LocationReading::new(1.0, 2.0, 150)));
//! assert_eq!(records[2].total_accel, Some(5.0));
//! ```

mod logging;

pub mod buffer;
pub mod fuser;
pub mod source;

pub use buffer::RecordBuffer;
pub use fuser::{fuse, Fusion, SensorEvent, SourceSubscriptions, StreamFuser};
pub use source::{ChannelSource, SampleSource, Subscription};
