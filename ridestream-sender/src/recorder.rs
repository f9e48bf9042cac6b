// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{BatchSender, Connection, FlushOutcome, SenderConfig, StopReceipt};
use ridestream_core::{LocationReading, MotionSample, Result};
use ridestream_fuse::{SampleSource, SourceSubscriptions, StreamFuser};
use std::sync::Arc;

/// Everything one recording owns on the device, from start to stop.
///
/// Created by [`RideRecorder::start`]; the source subscriptions are released
/// on the first [`stop`](RideRecorder::stop) attempt or when the recorder is
/// dropped, whichever comes first.
pub struct RideRecorder {
    fuser: StreamFuser,
    subscriptions: Option<SourceSubscriptions>,
    sender: BatchSender,
}

impl RideRecorder {
    /// Subscribe both sources and start the flush timer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<L, M>(
        locations: &L,
        motions: &M,
        connection: Arc<dyn Connection>,
        config: SenderConfig,
    ) -> Self
    where
        L: SampleSource<Reading = LocationReading>,
        M: SampleSource<Reading = MotionSample>,
    {
        let fuser = StreamFuser::new();
        let subscriptions = fuser.attach(locations, motions);
        let sender = BatchSender::start(fuser.buffer().clone(), connection, config);
        crate::info!("ride recording started");

        Self {
            fuser,
            subscriptions: Some(subscriptions),
            sender,
        }
    }

    #[must_use]
    pub fn fuser(&self) -> &StreamFuser {
        &self.fuser
    }

    /// Records buffered and not yet accepted by the connection.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.fuser.buffer().len()
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.subscriptions.is_some()
    }

    /// # Errors
    /// Returns [`ridestream_core::RideError::ChannelClosed`] after a successful stop.
    pub async fn flush_now(&self) -> Result<FlushOutcome> {
        self.sender.flush_now().await
    }

    /// Release both sources, then flush and stop the session.
    ///
    /// # Errors
    /// See [`BatchSender::stop`]; on error the unsent records stay buffered
    /// and the stop may be retried.
    pub async fn stop(&mut self) -> Result<StopReceipt> {
        if let Some(subscriptions) = self.subscriptions.take() {
            subscriptions.unsubscribe().await;
        }
        let receipt = self.sender.stop().await?;
        crate::info!(
            "ride recording stopped as session {} ({})",
            receipt.index,
            receipt.download_url
        );
        Ok(receipt)
    }
}
