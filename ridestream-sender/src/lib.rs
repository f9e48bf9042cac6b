// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions, clippy::doc_markdown)]
//! Device-side delivery of fused records.
//!
//! A [`BatchSender`] drains the fuser's buffer on a fixed cadence (30 s by
//! default) and sends it as one `data` frame over a persistent
//! [`Connection`]. Ticks that find an empty buffer or a connection that is
//! not ready do nothing; the records simply wait for the next tick. Stopping
//! performs one last flush, sends `stop` and waits for the service to report
//! the saved session.
//!
//! [`RideRecorder`] bundles the fuser, both source subscriptions and the
//! sender for one recording.

mod logging;

pub mod config;
pub mod connection;
pub mod recorder;
pub mod sender;

pub use config::SenderConfig;
pub use connection::{duplex, ClientConnection, Connection, ReadyState, ServerConnection};
pub use recorder::RideRecorder;
pub use sender::{flush, BatchSender, FlushOutcome, StopReceipt};
