// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{ObserverHub, SessionState};
use ridestream_core::{decode_batch, Batch, RideError, Result, ServerMessage};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Answer to an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub message: String,
    /// Records in this batch.
    pub received: usize,
    /// Records in the open session after appending this batch.
    pub total_stored: usize,
}

/// Appends uploaded batches to the open session.
///
/// Batches are appended whole and in the order they are accepted; records
/// are neither deduplicated nor sorted. Every accepted batch is also
/// rebroadcast, exactly as received, to the live observers.
#[derive(Clone)]
pub struct SessionIngress {
    state: Arc<SessionState>,
    observers: ObserverHub,
}

impl SessionIngress {
    #[must_use]
    pub fn new(state: Arc<SessionState>, observers: ObserverHub) -> Self {
        Self { state, observers }
    }

    /// Append an already decoded batch.
    ///
    /// # Errors
    /// Returns [`RideError::InvalidPayload`] if a record has neither a
    /// location nor an acceleration, or cannot be rendered for observers.
    pub fn ingest(&self, batch: Batch) -> Result<IngestReceipt> {
        if let Some(i) = batch.iter().position(|record| !record.is_valid()) {
            return Err(RideError::invalid_payload(format!(
                "record {i}: neither location nor totalAccel present"
            )));
        }
        let payload = serde_json::to_value(&batch)
            .map_err(|e| RideError::invalid_payload(format!("batch not serializable: {e}")))?;
        self.ingest_decoded(batch, payload)
    }

    /// Validate and append a JSON payload, keeping it verbatim for observers.
    ///
    /// # Errors
    /// Returns [`RideError::InvalidPayload`] if `payload` is not an array of
    /// fused records; nothing is appended then.
    pub fn ingest_json(&self, payload: Value) -> Result<IngestReceipt> {
        let batch = decode_batch(&payload)?;
        self.ingest_decoded(batch, payload)
    }

    /// Parse and append a raw upload body.
    ///
    /// # Errors
    /// Returns [`RideError::InvalidPayload`] if `body` is not JSON or not a
    /// batch.
    pub fn ingest_body(&self, body: &str) -> Result<IngestReceipt> {
        let payload: Value = serde_json::from_str(body)
            .map_err(|e| RideError::invalid_payload(format!("body is not JSON: {e}")))?;
        self.ingest_json(payload)
    }

    /// Append a batch already validated against `payload`.
    pub(crate) fn ingest_decoded(&self, batch: Batch, payload: Value) -> Result<IngestReceipt> {
        let received = batch.len();
        let frame = ServerMessage::Batch { payload }.encode()?;

        // Observers see batches in the same order they were appended.
        let total_stored = {
            let mut open = self.state.open();
            open.records.extend(batch);
            if received > 0 {
                self.observers.broadcast(&frame);
            }
            open.records.len()
        };

        crate::info!("received {} records, {} stored", received, total_stored);
        Ok(IngestReceipt {
            message: "Data received".to_string(),
            received,
            total_stored,
        })
    }
}
