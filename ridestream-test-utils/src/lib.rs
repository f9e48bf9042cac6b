// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test utilities and fixtures for the ridestream workspace.
//!
//! Not meant for production code.
//!
//! - `test_data` - readings and records for a short ride
//! - `interleave` - seeded arrival schedules for two sources
//! - `helpers` - async assertion helpers
//!
//! ```rust
//! use ridestream_test_utils::interleave::{interleave, Arrival};
//!
//! let schedule = interleave(vec![1, 2], vec!['a'], 7);
//! assert_eq!(schedule.len(), 3);
//! let lefts: Vec<_> = schedule
//!     .iter()
//!     .filter_map(|a| match a {
//!         Arrival::Left(v) => Some(*v),
//!         Arrival::Right(_) => None,
//!     })
//!     .collect();
//! assert_eq!(lefts, vec![1, 2]);
//! ```

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
pub mod helpers;
pub mod interleave;
pub mod test_data;

pub use helpers::{assert_no_element_emitted, expect_next, wait_until};
pub use interleave::{interleave, Arrival};
