// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Service side of the persistent connection.

use crate::Service;
use futures::StreamExt;
use ridestream_core::{decode_client_frame, ClientMessage, RideError, Result, ServerMessage};
use ridestream_sender::{Connection, ServerConnection};

/// Handle one client's frames until it disconnects.
///
/// `data` frames are ingested silently; an invalid one is answered with an
/// `error` frame and the connection stays usable. `stop` is answered with
/// `stopped` or `error`.
pub async fn serve_connection(service: Service, connection: ServerConnection) {
    crate::debug!("client connected");
    loop {
        let frame = match connection.recv_frame().await {
            Ok(frame) => frame,
            Err(RideError::ChannelClosed) => break,
            Err(e) => {
                crate::warn!("receive failed: {}", e);
                break;
            }
        };

        let reply = match handle_frame(&service, &frame) {
            Ok(None) => continue,
            Ok(Some(reply)) => reply,
            Err(e) => {
                crate::warn!("client frame rejected: {}", e);
                ServerMessage::error(&e)
            }
        };

        if let Err(e) = reply.encode().and_then(|frame| connection.send_frame(frame)) {
            crate::warn!("reply not delivered: {}", e);
            break;
        }
    }
    crate::debug!("client disconnected");
}

fn handle_frame(service: &Service, frame: &str) -> Result<Option<ServerMessage>> {
    match decode_client_frame(frame)? {
        ClientMessage::Data { batch, raw_payload } => {
            service.ingress().ingest_decoded(batch, raw_payload)?;
            Ok(None)
        }
        ClientMessage::Stop => {
            let finalized = service.finalize()?;
            Ok(Some(ServerMessage::Stopped {
                message: finalized.message(),
                index: finalized.index.external(),
                download_url: service.download_url(finalized.index),
            }))
        }
    }
}

/// Push every accepted batch to a passive observer until it disconnects.
pub async fn serve_observer(service: Service, connection: ServerConnection) {
    let mut frames = service.observe();
    crate::debug!("observer connected");
    loop {
        tokio::select! {
            frame = frames.next() => {
                let Some(frame) = frame else { break };
                if let Err(e) = connection.send_frame(frame) {
                    crate::debug!("observer gone: {}", e);
                    break;
                }
            }
            incoming = connection.recv_frame() => {
                if incoming.is_err() {
                    break;
                }
            }
        }
    }
    crate::debug!("observer disconnected");
}
