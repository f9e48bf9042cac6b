// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{ExportStore, SessionState};
use ridestream_core::{
    ExportArtifact, FusedRecord, RideError, RideSummary, Result, SessionIndex,
};
use std::mem;
use std::sync::Arc;

/// Outcome of a successful finalize.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedSession {
    pub index: SessionIndex,
    pub summary: RideSummary,
    pub artifact: ExportArtifact,
}

impl FinalizedSession {
    /// Confirmation shown to the rider.
    #[must_use]
    pub fn message(&self) -> String {
        format!(
            "Ride saved as {} ({} records)",
            self.index.file_name(),
            self.artifact.rows.len()
        )
    }
}

/// Closes the open session and persists it as an export artifact.
///
/// Taking the records out of the open session is the linearization point:
/// batches appended before it belong to the finalized session, batches
/// appended after it start the next one.
#[derive(Clone)]
pub struct SessionFinalizer {
    state: Arc<SessionState>,
    store: Arc<dyn ExportStore>,
}

impl SessionFinalizer {
    #[must_use]
    pub fn new(state: Arc<SessionState>, store: Arc<dyn ExportStore>) -> Self {
        Self { state, store }
    }

    /// Close the open session, write its artifact and open a fresh session.
    ///
    /// On failure the open session is as it was, plus any batches that
    /// arrived during the attempt, and the index stays unused.
    ///
    /// # Errors
    /// - [`RideError::EmptySession`] if the open session has no records
    /// - [`RideError::StorageWriteFailure`] if the artifact could not be written
    pub fn finalize(&self) -> Result<FinalizedSession> {
        let _writer = self.state.finalizing();

        let (index, records) = {
            let mut open = self.state.open();
            if open.records.is_empty() {
                return Err(RideError::EmptySession);
            }
            (open.next_index, mem::take(&mut open.records))
        };

        let artifact = ExportArtifact::from_records(index, &records);
        if let Err(e) = self.store.put(index, &artifact) {
            crate::error!("session {} not saved, {} records kept open: {}", index, records.len(), e);
            self.restore(records);
            return Err(e);
        }

        self.state.open().next_index = index.next();

        let summary = RideSummary::from_records(&records);
        crate::info!(
            "session {} saved as {} ({} records): {}",
            index,
            index.file_name(),
            records.len(),
            summary
        );

        Ok(FinalizedSession {
            index,
            summary,
            artifact,
        })
    }

    /// Put taken records back in front of anything appended meanwhile.
    fn restore(&self, mut records: Vec<FusedRecord>) {
        let mut open = self.state.open();
        records.append(&mut open.records);
        open.records = records;
    }
}
