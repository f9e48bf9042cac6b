// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Request handlers independent of any HTTP framework.
//!
//! Each handler takes the already extracted request input and returns an
//! [`EndpointResponse`]; a server binds them to routes such as
//! `POST /upload`, `POST /stop`, `GET /download/:n`, `GET /data` and
//! `GET /recent`.

use crate::Service;
use ridestream_core::{ErrorKind, RideError, SessionIndex};
use serde_json::{json, Value};
use std::sync::Arc;

/// Response payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    /// A CSV file served as an attachment.
    Csv {
        file_name: String,
        bytes: Arc<Vec<u8>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: Body,
}

impl EndpointResponse {
    #[must_use]
    pub fn ok(value: Value) -> Self {
        Self {
            status: 200,
            body: Body::Json(value),
        }
    }

    /// `{message}` error body with the status matching `err`.
    #[must_use]
    pub fn from_error(err: &RideError) -> Self {
        Self {
            status: status_of(err),
            body: Body::Json(json!({ "message": err.to_string() })),
        }
    }

    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self.body {
            Body::Json(_) => "application/json",
            Body::Csv { .. } => "text/csv",
        }
    }

    /// `Content-Disposition` header value for file downloads.
    #[must_use]
    pub fn content_disposition(&self) -> Option<String> {
        match &self.body {
            Body::Csv { file_name, .. } => Some(format!("attachment; filename=\"{file_name}\"")),
            Body::Json(_) => None,
        }
    }

    #[must_use]
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            Body::Csv { .. } => None,
        }
    }

    /// Serialized body.
    #[must_use]
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            Body::Json(value) => value.to_string().into_bytes(),
            Body::Csv { bytes, .. } => bytes.as_ref().clone(),
        }
    }
}

/// HTTP status for an error surfaced by a handler.
#[must_use]
pub const fn status_of(err: &RideError) -> u16 {
    match err.kind() {
        ErrorKind::InvalidPayload | ErrorKind::Protocol | ErrorKind::EmptySession => 400,
        ErrorKind::NotFound => 404,
        ErrorKind::ConnectionUnavailable => 503,
        ErrorKind::Timeout => 504,
        ErrorKind::StorageWriteFailure | ErrorKind::ChannelClosed => 500,
    }
}

/// `POST /upload` with a JSON array body.
#[must_use]
pub fn post_upload(service: &Service, body: &str) -> EndpointResponse {
    match service.ingest_body(body) {
        Ok(receipt) => EndpointResponse::ok(json!(receipt)),
        Err(e) => {
            crate::warn!("upload rejected: {}", e);
            EndpointResponse::from_error(&e)
        }
    }
}

/// `POST /stop`: finalize the open session.
#[must_use]
pub fn post_stop(service: &Service) -> EndpointResponse {
    match service.finalize() {
        Ok(finalized) => EndpointResponse::ok(json!({
            "message": finalized.message(),
            "index": finalized.index.external(),
            "downloadURL": service.download_url(finalized.index),
        })),
        Err(e) => EndpointResponse::from_error(&e),
    }
}

/// `GET /download/:n` with the 1-based session number.
#[must_use]
pub fn get_export(service: &Service, external: u64) -> EndpointResponse {
    let Some(index) = SessionIndex::from_external(external) else {
        return not_found(external);
    };
    match service.export(index) {
        Ok(bytes) => EndpointResponse {
            status: 200,
            body: Body::Csv {
                file_name: index.file_name(),
                bytes,
            },
        },
        Err(RideError::NotFound { .. }) => not_found(external),
        Err(e) => EndpointResponse::from_error(&e),
    }
}

fn not_found(external: u64) -> EndpointResponse {
    EndpointResponse {
        status: 404,
        body: Body::Json(json!({ "message": format!("No export found for session {external}") })),
    }
}

/// `GET /data`: records of the open session.
#[must_use]
pub fn get_data(service: &Service) -> EndpointResponse {
    EndpointResponse::ok(json!(service.snapshot()))
}

/// `GET /recent?n=`: newest finalized sessions with their links.
#[must_use]
pub fn get_recent(service: &Service, n: usize) -> EndpointResponse {
    let sessions: Vec<Value> = service
        .recent(n)
        .into_iter()
        .map(|index| {
            json!({
                "index": index.external(),
                "downloadURL": service.download_url(index),
            })
        })
        .collect();
    EndpointResponse::ok(Value::Array(sessions))
}
