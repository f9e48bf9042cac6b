// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use futures::stream::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::{sleep, timeout};

pub async fn assert_no_element_emitted<S, T>(stream: &mut S, timeout_ms: u64)
where
    S: Stream<Item = T> + Unpin,
{
    tokio::select! {
        _item = stream.next() => {
            panic!("Unexpected element emitted, expected no output.");
        }
        _ = sleep(Duration::from_millis(timeout_ms)) => {
        }
    }
}

/// Next element, failing the test if none arrives within `timeout_ms`.
pub async fn expect_next<S, T>(stream: &mut S, timeout_ms: u64) -> T
where
    S: Stream<Item = T> + Unpin,
{
    timeout(Duration::from_millis(timeout_ms), stream.next())
        .await
        .expect("timed out waiting for next element")
        .expect("stream ended before next element")
}

/// Poll `condition` every few milliseconds until it holds.
///
/// Panics after `timeout_ms`.
pub async fn wait_until<F>(mut condition: F, timeout_ms: u64)
where
    F: FnMut() -> bool,
{
    let poll = async {
        while !condition() {
            sleep(Duration::from_millis(2)).await;
        }
    };
    timeout(Duration::from_millis(timeout_ms), poll)
        .await
        .expect("condition not met in time");
}
