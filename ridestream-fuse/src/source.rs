// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Push-driven sample sources and their subscription handles.

use futures::stream::{BoxStream, StreamExt};
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

/// A lazy, infinite sequence of readings produced at the device's own rate.
///
/// A source cannot be paused; the only way to stop receiving readings is to
/// drop or [`unsubscribe`](Subscription::unsubscribe) the [`Subscription`].
pub trait SampleSource {
    type Reading: Send + 'static;

    /// Hand out the reading stream for a new subscriber.
    fn readings(&self) -> BoxStream<'static, Self::Reading>;

    /// Drive `handler` with every reading on a background task.
    ///
    /// Readings reach the handler one at a time in the order the source
    /// produced them. Readings already queued when the subscription is
    /// cancelled still reach the handler. Must be called from within a Tokio
    /// runtime.
    fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(Self::Reading) + Send + 'static,
    {
        Subscription::spawn(self.readings(), handler, || {})
    }
}

/// A source fed by device callbacks.
///
/// Clones share the same subscriber. [`ChannelSource::push`] never blocks;
/// readings pushed while nobody is subscribed are dropped.
pub struct ChannelSource<R> {
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<R>>>>,
}

impl<R: Send + 'static> ChannelSource<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
        }
    }

    /// Deliver one reading from the device.
    ///
    /// Returns `false` when there is no live subscriber.
    pub fn push(&self, reading: R) -> bool {
        let mut sender = self.sender.lock();
        let Some(tx) = sender.as_ref() else {
            return false;
        };
        if tx.send(reading).is_ok() {
            return true;
        }
        *sender = None;
        false
    }

    #[must_use]
    pub fn has_subscriber(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

impl<R: Send + 'static> Default for ChannelSource<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for ChannelSource<R> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<R: Send + 'static> SampleSource for ChannelSource<R> {
    type Reading = R;

    /// A later call replaces the earlier subscriber, whose stream then ends.
    fn readings(&self) -> BoxStream<'static, R> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sender.lock() = Some(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }

    /// On cancellation the source stops accepting readings before the queue
    /// is drained, so every `push` that returned `true` reaches `handler`.
    fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(R) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let ours = tx.downgrade();
        *self.sender.lock() = Some(tx);
        let slot = Arc::clone(&self.sender);
        let close = move || {
            let mut sender = slot.lock();
            let current = ours
                .upgrade()
                .is_some_and(|ours| sender.as_ref().is_some_and(|tx| tx.same_channel(&ours)));
            if current {
                *sender = None;
            }
        };
        Subscription::spawn(UnboundedReceiverStream::new(rx).boxed(), handler, close)
    }
}

/// Owned handle to a running source subscription.
///
/// Dropping the handle cancels the subscription; [`Subscription::unsubscribe`]
/// additionally waits until the handler has returned for the last time.
pub struct Subscription {
    cancel_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// `close` runs once on cancellation, before the queued readings are
    /// drained; a source uses it to stop accepting new readings.
    pub(crate) fn spawn<R, F, C>(readings: BoxStream<'static, R>, mut handler: F, close: C) -> Self
    where
        R: Send + 'static,
        F: FnMut(R) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let handle = tokio::spawn(async move {
            let mut readings = readings;
            let cancelled = loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break true,
                    next = readings.next() => match next {
                        Some(reading) => handler(reading),
                        None => break false,
                    },
                }
            };
            if cancelled {
                close();
                let mut drained = 0usize;
                while let Some(Some(reading)) = readings.next().now_or_never() {
                    handler(reading);
                    drained += 1;
                }
                crate::debug!("{} queued readings drained after cancellation", drained);
            }
            crate::debug!("source subscription finished");
        });

        Self {
            cancel_token,
            task_handle: Some(handle),
        }
    }

    /// `false` once cancelled or once the source stream ended.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.cancel_token.is_cancelled()
            && self
                .task_handle
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel and wait for the handler task to exit.
    pub async fn unsubscribe(mut self) {
        self.cancel_token.cancel();
        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                crate::warn!("source handler task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
