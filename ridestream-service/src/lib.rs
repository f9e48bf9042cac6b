// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Collection side of a ride: uploaded batches in, CSV artifacts out.
//!
//! A [`Service`] holds exactly one open session. Batches are appended to it
//! by [`SessionIngress`] in arrival order; [`SessionFinalizer`] closes it,
//! writes the `timestamp,latitude,longitude,total_accel` export to an
//! [`ExportStore`] under the next session index, and opens a fresh session.
//!
//! ```
//! use ridestream_service::Service;
//! use ridestream_core::RideError;
//!
//! let service = Service::in_memory();
//! service
//!     .ingest_body(r#"[{"capturedAt":100,"totalAccel":1.0},
//!                     {"capturedAt":150,"location":{"latitude":1.0,"longitude":2.0,"capturedAt":150}}]"#)
//!     .unwrap();
//!
//! let finalized = service.finalize().unwrap();
//! assert_eq!(finalized.index.external(), 1);
//!
//! let csv = service.export(finalized.index).unwrap();
//! assert_eq!(
//!     std::str::from_utf8(&csv).unwrap(),
//!     "timestamp,latitude,longitude,total_accel\n100,,,1\n150,1,2,\n"
//! );
//!
//! assert!(matches!(service.finalize(), Err(RideError::EmptySession)));
//! ```
//!
//! Request handlers for an HTTP front end live in [`endpoints`]; the
//! persistent connection is served by [`serve_connection`] and
//! [`serve_observer`].

mod logging;

pub mod config;
pub mod endpoints;
pub mod finalizer;
pub mod ingress;
pub mod observers;
pub mod server;
pub mod service;
pub mod session;
pub mod store;

pub use config::ServiceConfig;
pub use endpoints::{Body, EndpointResponse};
pub use finalizer::{FinalizedSession, SessionFinalizer};
pub use ingress::{IngestReceipt, SessionIngress};
pub use observers::ObserverHub;
pub use server::{serve_connection, serve_observer};
pub use service::Service;
pub use session::{SessionState, SessionStatusView};
pub use store::{ExportStore, FsExportStore, MemoryExportStore};
