// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]
//! Error types for the ridestream pipeline
//!
//! Every failure a caller can observe, from a malformed upload body to a
//! storage write that did not complete, maps to one [`RideError`] variant.
//! The variants are stable enough to cross the wire: [`RideError::kind`]
//! returns an [`ErrorKind`] whose string form is what the service sends in
//! `{"type":"error"}` frames, and [`RideError::from_wire`] rebuilds the error
//! on the client side.
//!
//! # Examples
//!
//! ```
//! use ridestream_error::{ErrorKind, RideError, Result};
//!
//! fn finalize(records: usize) -> Result<u64> {
//!     if records == 0 {
//!         return Err(RideError::EmptySession);
//!     }
//!     Ok(0)
//! }
//!
//! let err = finalize(0).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::EmptySession);
//! assert!(err.nothing_saved());
//! ```

use std::fmt;
use std::time::Duration;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Root error type for all ridestream operations
#[derive(Debug, thiserror::Error)]
pub enum RideError {
    /// Upload body or data frame is not a sequence of fused records
    ///
    /// Rejected as a whole; nothing from the payload is appended.
    #[error("Invalid payload: {message}")]
    InvalidPayload {
        /// What was wrong with the payload
        message: String,
    },

    /// Stop requested while the open session holds no records
    #[error("Nothing was saved: the current session has no records")]
    EmptySession,

    /// No artifact exists for the requested session index
    #[error("No export found for session index {index}")]
    NotFound {
        /// The internal (0-based) session index that was requested
        index: u64,
    },

    /// No ready connection to send on
    ///
    /// Routine flush ticks swallow this; a stop surfaces it because the
    /// buffered records could not be delivered.
    #[error("Connection unavailable, nothing was sent: {context}")]
    ConnectionUnavailable {
        /// Which operation needed the connection
        context: String,
    },

    /// Artifact persistence failed
    ///
    /// The open session is left intact and finalize may be retried.
    #[error("Nothing was saved, artifact write failed: {context}")]
    StorageWriteFailure {
        /// Which write failed
        context: String,
        /// Underlying I/O or encoding error, when one exists locally
        #[source]
        source: Option<BoxedSource>,
    },

    /// An awaited acknowledgment did not arrive in time
    ///
    /// The outcome on the remote side is unknown.
    #[error("Operation timed out after {duration:?}: {operation}")]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// How long we waited
        duration: Duration,
    },

    /// A frame could not be decoded or was not expected at this point
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the offending frame
        message: String,
    },

    /// The peer end of a connection was dropped
    #[error("Channel closed: peer dropped")]
    ChannelClosed,
}

/// Stable, wire-safe classification of a [`RideError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPayload,
    EmptySession,
    NotFound,
    ConnectionUnavailable,
    StorageWriteFailure,
    Timeout,
    Protocol,
    ChannelClosed,
}

impl ErrorKind {
    /// The snake_case tag used on the wire
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidPayload => "invalid_payload",
            Self::EmptySession => "empty_session",
            Self::NotFound => "not_found",
            Self::ConnectionUnavailable => "connection_unavailable",
            Self::StorageWriteFailure => "storage_write_failure",
            Self::Timeout => "timeout",
            Self::Protocol => "protocol",
            Self::ChannelClosed => "channel_closed",
        }
    }

    /// Parse a wire tag back into a kind
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let kind = match tag {
            "invalid_payload" => Self::InvalidPayload,
            "empty_session" => Self::EmptySession,
            "not_found" => Self::NotFound,
            "connection_unavailable" => Self::ConnectionUnavailable,
            "storage_write_failure" => Self::StorageWriteFailure,
            "timeout" => Self::Timeout,
            "protocol" => Self::Protocol,
            "channel_closed" => Self::ChannelClosed,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RideError {
    /// Create an invalid payload error with the given message
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Create a not found error for an internal session index
    #[must_use]
    pub const fn not_found(index: u64) -> Self {
        Self::NotFound { index }
    }

    /// Create a connection unavailable error with the given context
    pub fn connection_unavailable(context: impl Into<String>) -> Self {
        Self::ConnectionUnavailable {
            context: context.into(),
        }
    }

    /// Create a storage failure without a local source error
    pub fn storage(context: impl Into<String>) -> Self {
        Self::StorageWriteFailure {
            context: context.into(),
            source: None,
        }
    }

    /// Create a storage failure caused by `source`
    pub fn storage_caused_by(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::StorageWriteFailure {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a protocol error with the given message
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// The wire-safe classification of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPayload { .. } => ErrorKind::InvalidPayload,
            Self::EmptySession => ErrorKind::EmptySession,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConnectionUnavailable { .. } => ErrorKind::ConnectionUnavailable,
            Self::StorageWriteFailure { .. } => ErrorKind::StorageWriteFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::ChannelClosed => ErrorKind::ChannelClosed,
        }
    }

    /// Rebuild an error received in a `{"type":"error"}` frame
    ///
    /// `message` is the remote display string; it becomes the context of the
    /// rebuilt error where the variant carries one.
    pub fn from_wire(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::InvalidPayload => Self::InvalidPayload { message },
            ErrorKind::EmptySession => Self::EmptySession,
            ErrorKind::NotFound => Self::NotFound { index: 0 },
            ErrorKind::ConnectionUnavailable => Self::ConnectionUnavailable { context: message },
            ErrorKind::StorageWriteFailure => Self::storage(message),
            ErrorKind::Timeout => Self::Timeout {
                operation: message,
                duration: Duration::ZERO,
            },
            ErrorKind::Protocol => Self::Protocol { message },
            ErrorKind::ChannelClosed => Self::ChannelClosed,
        }
    }

    /// Check if this error is transient and the operation may be retried
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionUnavailable { .. } | Self::StorageWriteFailure { .. } | Self::Timeout { .. }
        )
    }

    /// `true` when the failed operation is known to have persisted nothing
    ///
    /// Only a timeout leaves the remote outcome unknown.
    #[must_use]
    pub const fn nothing_saved(&self) -> bool {
        !matches!(self, Self::Timeout { .. })
    }
}

impl From<std::io::Error> for RideError {
    fn from(err: std::io::Error) -> Self {
        Self::storage_caused_by("i/o error", err)
    }
}

/// Specialized Result type for ridestream operations
pub type Result<T> = std::result::Result<T, RideError>;

/// Helper trait for adding context to `Result`s
pub trait ResultExt<T> {
    /// Prefix the context of a connection or storage error
    ///
    /// # Errors
    /// Returns `Err(RideError)` if the underlying result is `Err`.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Lazily evaluated variant of [`ResultExt::context`]
    ///
    /// # Errors
    /// Returns `Err(RideError)` if the underlying result is `Err`.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

fn prefix_context(err: RideError, context: &str) -> RideError {
    match err {
        RideError::StorageWriteFailure { context: inner, source } => RideError::StorageWriteFailure {
            context: format!("{context}: {inner}"),
            source,
        },
        RideError::ConnectionUnavailable { context: inner } => RideError::ConnectionUnavailable {
            context: format!("{context}: {inner}"),
        },
        other => other,
    }
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<RideError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| prefix_context(e.into(), &context.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| prefix_context(e.into(), &f()))
    }
}
