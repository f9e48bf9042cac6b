// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Fan-out of live `batch` frames to passive observers.
///
/// Observers joining late only see frames broadcast after they joined.
/// Broadcasting never blocks: every observer has an unbounded queue, and an
/// observer whose stream was dropped is removed on the next broadcast.
pub struct ObserverHub {
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<String>>>>,
}

impl ObserverHub {
    #[must_use]
    pub fn new() -> Self {
        Self {
            senders: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start receiving every frame broadcast from now on.
    pub fn subscribe(&self) -> BoxStream<'static, String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().push(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }

    /// Send `frame` to all live observers; returns how many received it.
    pub fn broadcast(&self, frame: &str) -> usize {
        let mut senders = self.senders.lock();
        let before = senders.len();
        senders.retain(|tx| tx.send(frame.to_string()).is_ok());

        let pruned = before - senders.len();
        if pruned > 0 {
            crate::debug!("pruned {} disconnected observers", pruned);
        }
        senders.len()
    }

    /// Observers registered as of the last broadcast.
    ///
    /// Dropped observers are only removed by the next `broadcast`.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.senders.lock().len()
    }
}

impl Default for ObserverHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ObserverHub {
    fn clone(&self) -> Self {
        Self {
            senders: Arc::clone(&self.senders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_observer_is_pruned_on_next_broadcast() {
        let hub = ObserverHub::new();
        let mut kept = hub.subscribe();
        let dropped = hub.subscribe();
        drop(dropped);

        assert_eq!(hub.observer_count(), 2);
        assert_eq!(hub.broadcast("frame"), 1);
        assert_eq!(hub.observer_count(), 1);
        assert_eq!(kept.next().await.as_deref(), Some("frame"));
    }

    #[test]
    fn broadcast_without_observers_is_a_no_op() {
        assert_eq!(ObserverHub::new().broadcast("frame"), 0);
    }
}
