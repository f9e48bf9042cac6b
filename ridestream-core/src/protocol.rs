// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! JSON text frames exchanged over the persistent connection.
//!
//! Client to service:
//!
//! ```text
//! {"type":"data","payload":[{"capturedAt":100,"totalAccel":1.0}, ...]}
//! {"type":"stop"}
//! ```
//!
//! Service to client and observers:
//!
//! ```text
//! {"type":"batch","payload":[...]}                       // live rebroadcast, verbatim
//! {"type":"stopped","message":"...","index":1,"downloadURL":"/download/1"}
//! {"type":"error","kind":"empty_session","message":"..."}
//! ```

use crate::{decode_batch, Batch, FusedRecord};
use ridestream_error::{ErrorKind, RideError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A decoded client frame.
///
/// `raw_payload` keeps the payload exactly as received so observers can be
/// sent the verbatim batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Data { batch: Batch, raw_payload: Value },
    Stop,
}

#[derive(Serialize)]
struct DataFrame<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    payload: &'a [FusedRecord],
}

/// Encode buffered records as a `data` frame without copying them.
///
/// # Errors
/// Returns [`RideError::Protocol`] if a record holds a non-finite float or
/// cannot be serialized.
pub fn encode_data_frame(records: &[FusedRecord]) -> Result<String> {
    if let Some(position) = records.iter().position(|record| !record.is_finite()) {
        return Err(RideError::protocol(format!(
            "record {position}: non-finite value cannot be encoded"
        )));
    }
    serde_json::to_string(&DataFrame {
        kind: "data",
        payload: records,
    })
    .map_err(|e| RideError::protocol(format!("encoding data frame: {e}")))
}

#[must_use]
pub fn encode_stop_frame() -> String {
    r#"{"type":"stop"}"#.to_string()
}

/// Decode a client frame.
///
/// # Errors
/// - [`RideError::Protocol`] for non-JSON frames or an unknown `type`
/// - [`RideError::InvalidPayload`] when a `data` payload is not a valid batch
pub fn decode_client_frame(frame: &str) -> Result<ClientMessage> {
    let mut value: Value = serde_json::from_str(frame)
        .map_err(|e| RideError::protocol(format!("frame is not JSON: {e}")))?;

    let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);

    match kind.as_deref() {
        Some("data") => {
            let raw_payload = value
                .get_mut("payload")
                .map(Value::take)
                .ok_or_else(|| RideError::invalid_payload("data frame without payload"))?;
            let batch = decode_batch(&raw_payload)?;
            Ok(ClientMessage::Data { batch, raw_payload })
        }
        Some("stop") => Ok(ClientMessage::Stop),
        Some(other) => Err(RideError::protocol(format!("unknown frame type {other:?}"))),
        None => Err(RideError::protocol("frame without type tag")),
    }
}

/// A frame sent by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Batch {
        payload: Value,
    },
    Stopped {
        message: String,
        index: u64,
        #[serde(rename = "downloadURL")]
        download_url: String,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl ServerMessage {
    #[must_use]
    pub fn error(err: &RideError) -> Self {
        Self::Error {
            kind: err.kind().as_str().to_string(),
            message: err.to_string(),
        }
    }

    /// Encode as a text frame.
    ///
    /// # Errors
    /// Returns [`RideError::Protocol`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| RideError::protocol(format!("encoding server frame: {e}")))
    }

    /// Decode a text frame.
    ///
    /// # Errors
    /// Returns [`RideError::Protocol`] if the frame is not a server message.
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame)
            .map_err(|e| RideError::protocol(format!("decoding server frame: {e}")))
    }

    /// Turn an `error` frame back into the error it describes.
    #[must_use]
    pub fn into_error(self) -> Option<RideError> {
        match self {
            Self::Error { kind, message } => {
                let kind = ErrorKind::parse(&kind).unwrap_or(ErrorKind::Protocol);
                Some(RideError::from_wire(kind, message))
            }
            _ => None,
        }
    }
}
