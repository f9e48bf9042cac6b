// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Persistent duplex connection carrying JSON text frames.
//!
//! [`Connection`] is the seam a WebSocket (or any ordered, reliable byte
//! stream) plugs into. [`duplex`] provides an in-process pair used by the
//! service's connection loop and by tests.

use async_trait::async_trait;
use ridestream_core::{RideError, Result};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// An ordered, reliable channel of text frames.
#[async_trait]
pub trait Connection: Send + Sync {
    /// `true` when frames sent now would be accepted.
    fn is_ready(&self) -> bool;

    /// Hand a frame to the connection.
    ///
    /// `Ok` means the local connection object accepted the frame; there is
    /// no delivery confirmation beyond that.
    ///
    /// # Errors
    /// Returns [`RideError::ConnectionUnavailable`] if the frame was not accepted.
    fn send_frame(&self, frame: String) -> Result<()>;

    /// Wait for the next frame from the peer.
    ///
    /// # Errors
    /// Returns [`RideError::ChannelClosed`] once the peer is gone.
    async fn recv_frame(&self) -> Result<String>;
}

/// Lifecycle of a connection, mirroring WebSocket `readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

#[derive(Debug)]
struct Endpoint {
    outgoing: mpsc::UnboundedSender<String>,
    incoming: Mutex<mpsc::UnboundedReceiver<String>>,
    state: Arc<AtomicU8>,
}

impl Endpoint {
    fn ready_state(&self) -> ReadyState {
        if self.outgoing.is_closed() {
            return ReadyState::Closed;
        }
        ReadyState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn send(&self, frame: String) -> Result<()> {
        match self.ready_state() {
            ReadyState::Open => self
                .outgoing
                .send(frame)
                .map_err(|_| RideError::connection_unavailable("peer dropped")),
            other => Err(RideError::connection_unavailable(format!(
                "connection is {other:?}"
            ))),
        }
    }

    async fn recv(&self) -> Result<String> {
        self.incoming
            .lock()
            .await
            .recv()
            .await
            .ok_or(RideError::ChannelClosed)
    }
}

/// Client (device) end of a [`duplex`] pair.
#[derive(Debug)]
pub struct ClientConnection {
    endpoint: Endpoint,
}

/// Service end of a [`duplex`] pair.
#[derive(Debug)]
pub struct ServerConnection {
    endpoint: Endpoint,
}

/// Create a connected, open client/service pair.
#[must_use]
pub fn duplex() -> (ClientConnection, ServerConnection) {
    let (to_server, from_client) = mpsc::unbounded_channel();
    let (to_client, from_server) = mpsc::unbounded_channel();
    let state = Arc::new(AtomicU8::new(ReadyState::Open as u8));

    let client = ClientConnection {
        endpoint: Endpoint {
            outgoing: to_server,
            incoming: Mutex::new(from_server),
            state: Arc::clone(&state),
        },
    };
    let server = ServerConnection {
        endpoint: Endpoint {
            outgoing: to_client,
            incoming: Mutex::new(from_client),
            state,
        },
    };
    (client, server)
}

impl ClientConnection {
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.endpoint.ready_state()
    }

    /// Move both ends to `state`, e.g. `Connecting` while a link is re-established.
    pub fn set_ready_state(&self, state: ReadyState) {
        self.endpoint.state.store(state as u8, Ordering::Release);
    }

    pub fn close(&self) {
        self.set_ready_state(ReadyState::Closed);
    }
}

impl ServerConnection {
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.endpoint.ready_state()
    }
}

#[async_trait]
impl Connection for ClientConnection {
    fn is_ready(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    fn send_frame(&self, frame: String) -> Result<()> {
        self.endpoint.send(frame)
    }

    async fn recv_frame(&self) -> Result<String> {
        self.endpoint.recv().await
    }
}

#[async_trait]
impl Connection for ServerConnection {
    fn is_ready(&self) -> bool {
        self.ready_state() == ReadyState::Open
    }

    fn send_frame(&self, frame: String) -> Result<()> {
        self.endpoint.send(frame)
    }

    async fn recv_frame(&self) -> Result<String> {
        self.endpoint.recv().await
    }
}
