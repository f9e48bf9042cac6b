// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use ridestream_error::{ErrorKind, RideError, Result, ResultExt};
use std::error::Error;
use std::io;
use std::time::Duration;

#[test]
fn test_error_display() {
    let err = RideError::invalid_payload("expected an array");
    assert_eq!(err.to_string(), "Invalid payload: expected an array");

    let err = RideError::not_found(4);
    assert_eq!(err.to_string(), "No export found for session index 4");
}

#[test]
fn test_stop_failures_say_nothing_was_saved() {
    assert!(RideError::EmptySession.to_string().starts_with("Nothing was saved"));
    assert!(RideError::storage("disk full")
        .to_string()
        .starts_with("Nothing was saved"));
    assert!(RideError::connection_unavailable("stop")
        .to_string()
        .contains("nothing was sent"));
}

#[test]
fn test_nothing_saved_excludes_timeout() {
    assert!(RideError::EmptySession.nothing_saved());
    assert!(RideError::storage("x").nothing_saved());
    assert!(!RideError::timeout("stop ack", Duration::from_secs(1)).nothing_saved());
}

#[test]
fn test_is_recoverable() {
    assert!(RideError::connection_unavailable("tick").is_recoverable());
    assert!(RideError::storage("x").is_recoverable());
    assert!(!RideError::EmptySession.is_recoverable());
    assert!(!RideError::invalid_payload("x").is_recoverable());
}

#[test]
fn test_kind_round_trips_through_wire_tag() {
    let kinds = [
        ErrorKind::InvalidPayload,
        ErrorKind::EmptySession,
        ErrorKind::NotFound,
        ErrorKind::ConnectionUnavailable,
        ErrorKind::StorageWriteFailure,
        ErrorKind::Timeout,
        ErrorKind::Protocol,
        ErrorKind::ChannelClosed,
    ];

    for kind in kinds {
        assert_eq!(ErrorKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(ErrorKind::parse("bogus"), None);
}

#[test]
fn test_from_wire_rebuilds_matching_variant() {
    let err = RideError::from_wire(ErrorKind::EmptySession, "ignored");
    assert!(matches!(err, RideError::EmptySession));

    let err = RideError::from_wire(ErrorKind::StorageWriteFailure, "disk full");
    assert_eq!(err.kind(), ErrorKind::StorageWriteFailure);
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn test_io_error_becomes_storage_failure_with_source() {
    let err: RideError = io::Error::other("no space left").into();

    assert_eq!(err.kind(), ErrorKind::StorageWriteFailure);
    assert!(err.source().is_some());
}

#[test]
fn test_result_context_prefixes_storage_errors() {
    let result: Result<()> = Err(RideError::storage("rename failed"));

    let err = result.context("writing ride_3.csv").unwrap_err();

    assert_eq!(
        err.to_string(),
        "Nothing was saved, artifact write failed: writing ride_3.csv: rename failed"
    );
}

#[test]
fn test_result_context_preserves_other_errors() {
    let result: Result<()> = Err(RideError::EmptySession);

    let err = result.with_context(|| "finalize".to_string()).unwrap_err();

    assert!(matches!(err, RideError::EmptySession));
}

#[test]
fn test_io_result_context() -> anyhow::Result<()> {
    let result: std::result::Result<(), io::Error> = Err(io::Error::other("denied"));

    let err = result.context("creating export dir").unwrap_err();

    assert!(err.to_string().contains("creating export dir"));
    Ok(())
}
