// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::{Mutex, MutexGuard};
use ridestream_core::{FusedRecord, SessionIndex};
use serde::Serialize;

/// Records of the session currently accepting batches.
#[derive(Debug)]
pub(crate) struct OpenSession {
    pub(crate) records: Vec<FusedRecord>,
    /// Index the open session will get if it is finalized successfully.
    pub(crate) next_index: SessionIndex,
}

/// The accumulator shared by ingress and finalizer.
///
/// `open` is the only shared mutable state of the service; every append and
/// every take happens under it. `finalizing` is held for the whole of a
/// finalize so two stops can never race for the same index.
#[derive(Debug)]
pub struct SessionState {
    open: Mutex<OpenSession>,
    finalizing: Mutex<()>,
}

impl SessionState {
    /// Fresh state whose first session will be `first_index`.
    #[must_use]
    pub fn starting_at(first_index: SessionIndex) -> Self {
        Self {
            open: Mutex::new(OpenSession {
                records: Vec::new(),
                next_index: first_index,
            }),
            finalizing: Mutex::new(()),
        }
    }

    pub(crate) fn open(&self) -> MutexGuard<'_, OpenSession> {
        self.open.lock()
    }

    pub(crate) fn finalizing(&self) -> MutexGuard<'_, ()> {
        self.finalizing.lock()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatusView {
        let open = self.open.lock();
        SessionStatusView {
            next_index: open.next_index,
            open_count: open.records.len(),
        }
    }

    /// Copy of the open session's records, in arrival order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<FusedRecord> {
        self.open.lock().records.clone()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::starting_at(SessionIndex::FIRST)
    }
}

/// Point-in-time view of the open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusView {
    pub next_index: SessionIndex,
    pub open_count: usize,
}
