// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{Connection, SenderConfig};
use ridestream_core::{
    encode_data_frame, encode_stop_frame, FusedRecord, RideError, Result, ResultExt, ServerMessage,
};
use ridestream_fuse::RecordBuffer;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// What one flush attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// A `data` frame with this many records was accepted by the connection.
    Sent(usize),
    SkippedEmpty,
    SkippedNotReady,
    /// The connection refused the frame; the records stay buffered.
    Deferred,
}

/// Acknowledgment of a stopped session, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopReceipt {
    pub message: String,
    /// 1-based session number.
    pub index: u64,
    pub download_url: String,
}

enum Command {
    Flush(oneshot::Sender<FlushOutcome>),
    Stop(oneshot::Sender<Result<StopReceipt>>),
}

/// Periodic drain of a [`RecordBuffer`] onto a [`Connection`].
///
/// One actor task owns both the flush timer and the stop request, so a
/// tick and a stop can never observe the buffer at the same time.
pub struct BatchSender {
    commands: mpsc::UnboundedSender<Command>,
    cancel_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl BatchSender {
    /// Start the flush timer for one session.
    ///
    /// The first tick fires one full interval after start. Must be called
    /// from within a Tokio runtime.
    pub fn start(buffer: RecordBuffer, connection: Arc<dyn Connection>, config: SenderConfig) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let handle = tokio::spawn(async move {
            Self::run(buffer, connection, config, rx, token).await;
        });

        Self {
            commands,
            cancel_token,
            task_handle: Some(handle),
        }
    }

    /// Run one flush now, outside the timer cadence.
    ///
    /// # Errors
    /// Returns [`RideError::ChannelClosed`] if the sender already stopped.
    pub async fn flush_now(&self) -> Result<FlushOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(Command::Flush(reply))
            .map_err(|_| RideError::ChannelClosed)?;
        outcome.await.map_err(|_| RideError::ChannelClosed)
    }

    /// Final flush, `stop` frame, then wait for the service's answer.
    ///
    /// On error nothing was lost locally: records that could not be sent are
    /// still buffered and the timer keeps running, so the stop may be retried.
    ///
    /// # Errors
    /// - [`RideError::ConnectionUnavailable`] if the connection is not ready
    /// - [`RideError::EmptySession`] / [`RideError::StorageWriteFailure`] as
    ///   reported by the service
    /// - [`RideError::Timeout`] if no answer arrives within the ack timeout
    pub async fn stop(&mut self) -> Result<StopReceipt> {
        let (reply, result) = oneshot::channel();
        self.commands
            .send(Command::Stop(reply))
            .map_err(|_| RideError::ChannelClosed)?;
        let receipt = result.await.map_err(|_| RideError::ChannelClosed)??;

        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                crate::warn!("batch sender task ended abnormally: {}", e);
            }
        }
        Ok(receipt)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn run(
        buffer: RecordBuffer,
        connection: Arc<dyn Connection>,
        config: SenderConfig,
        mut commands: mpsc::UnboundedReceiver<Command>,
        cancel_token: CancellationToken,
    ) {
        let mut ticker = interval_at(Instant::now() + config.flush_interval, config.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        crate::info!("batch sender started, flushing every {:?}", config.flush_interval);

        loop {
            select! {
                _ = ticker.tick() => {
                    flush(&buffer, connection.as_ref());
                }
                command = commands.recv() => match command {
                    Some(Command::Flush(reply)) => {
                        let _ = reply.send(flush(&buffer, connection.as_ref()));
                    }
                    Some(Command::Stop(reply)) => {
                        let result = stop_session(&buffer, connection.as_ref(), config.ack_timeout).await;
                        let stopped = result.is_ok();
                        if let Err(e) = &result {
                            crate::warn!("stop failed: {}", e);
                        }
                        let _ = reply.send(result);
                        if stopped {
                            break;
                        }
                    }
                    None => break,
                },
                _ = cancel_token.cancelled() => break,
            }
        }

        crate::info!("batch sender stopped");
    }
}

impl Drop for BatchSender {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Send everything buffered as one `data` frame, clearing only on success.
///
/// The buffer stays locked from encoding until clearing, so records that
/// arrive meanwhile wait and end up in the next batch. Records holding NaN
/// or infinite values are discarded with a warning before encoding.
pub fn flush(buffer: &RecordBuffer, connection: &dyn Connection) -> FlushOutcome {
    let mut records = buffer.lock();
    if records.is_empty() {
        crate::debug!("flush skipped: buffer empty");
        return FlushOutcome::SkippedEmpty;
    }
    if !connection.is_ready() {
        crate::debug!("flush skipped: connection not ready, {} records kept", records.len());
        return FlushOutcome::SkippedNotReady;
    }
    discard_non_finite(&mut records);
    if records.is_empty() {
        return FlushOutcome::SkippedEmpty;
    }

    match encode_data_frame(&records).and_then(|frame| connection.send_frame(frame)) {
        Ok(()) => {
            let count = records.len();
            records.clear();
            crate::info!("flushed batch of {} records", count);
            FlushOutcome::Sent(count)
        }
        Err(e) => {
            crate::warn!("flush deferred, {} records kept: {}", records.len(), e);
            FlushOutcome::Deferred
        }
    }
}

/// A record JSON cannot represent would make the service reject the whole
/// batch, so it is dropped here instead.
fn discard_non_finite(records: &mut Vec<FusedRecord>) {
    let before = records.len();
    records.retain(FusedRecord::is_finite);
    let dropped = before - records.len();
    if dropped > 0 {
        crate::warn!("dropped {} records with non-finite values", dropped);
    }
}

async fn stop_session(
    buffer: &RecordBuffer,
    connection: &dyn Connection,
    ack_timeout: Duration,
) -> Result<StopReceipt> {
    if !connection.is_ready() {
        return Err(RideError::connection_unavailable("cannot stop"));
    }

    {
        let mut records = buffer.lock();
        discard_non_finite(&mut records);
        if !records.is_empty() {
            let frame = encode_data_frame(&records)?;
            connection.send_frame(frame).context("final flush")?;
            crate::info!("final batch of {} records sent", records.len());
            records.clear();
        }
    }

    connection
        .send_frame(encode_stop_frame())
        .context("sending stop")?;

    timeout(ack_timeout, await_stop_reply(connection))
        .await
        .map_err(|_| RideError::timeout("waiting for stop acknowledgment", ack_timeout))?
}

async fn await_stop_reply(connection: &dyn Connection) -> Result<StopReceipt> {
    loop {
        let frame = connection.recv_frame().await?;
        match ServerMessage::decode(&frame)? {
            ServerMessage::Stopped {
                message,
                index,
                download_url,
            } => {
                return Ok(StopReceipt {
                    message,
                    index,
                    download_url,
                })
            }
            ServerMessage::Batch { .. } => continue,
            error @ ServerMessage::Error { .. } => {
                return Err(error
                    .into_error()
                    .unwrap_or_else(|| RideError::protocol("unreadable error frame")));
            }
        }
    }
}
