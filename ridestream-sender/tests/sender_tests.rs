// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use ridestream_core::{
    decode_client_frame, ClientMessage, FusedRecord, RideError, Result, ServerMessage,
};
use ridestream_fuse::RecordBuffer;
use ridestream_sender::{
    duplex, flush, BatchSender, Connection, FlushOutcome, ReadyState, SenderConfig,
    ServerConnection,
};
use ridestream_test_utils::test_data::{accel_burst, accel_record, location_record};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Claims to be ready but refuses every frame.
struct RefusingConnection {
    attempts: AtomicUsize,
}

#[async_trait]
impl Connection for RefusingConnection {
    fn is_ready(&self) -> bool {
        true
    }

    fn send_frame(&self, _frame: String) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(RideError::connection_unavailable("transport refused frame"))
    }

    async fn recv_frame(&self) -> Result<String> {
        std::future::pending().await
    }
}

async fn next_client_message(server: &ServerConnection) -> anyhow::Result<ClientMessage> {
    let frame = tokio::time::timeout(Duration::from_secs(120), server.recv_frame()).await??;
    Ok(decode_client_frame(&frame)?)
}

fn reply(server: &ServerConnection, message: &ServerMessage) -> anyhow::Result<()> {
    server.send_frame(message.encode()?)?;
    Ok(())
}

fn stopped(index: u64) -> ServerMessage {
    ServerMessage::Stopped {
        message: "Ride saved".to_string(),
        index,
        download_url: format!("/download/{index}"),
    }
}

#[tokio::test]
async fn test_flush_of_empty_buffer_sends_nothing() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let buffer = RecordBuffer::new();

    // Act
    let outcome = flush(&buffer, &client);

    // Assert
    assert_eq!(outcome, FlushOutcome::SkippedEmpty);
    assert!(buffer.is_empty());
    assert!(
        tokio::time::timeout(Duration::from_millis(50), server.recv_frame())
            .await
            .is_err(),
        "no frame expected"
    );
    Ok(())
}

#[tokio::test]
async fn test_flush_sends_whole_buffer_as_one_data_frame() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let buffer = RecordBuffer::new();
    let records = vec![accel_record(100, 1.0), location_record(150, 1.0, 2.0)];
    for record in records.clone() {
        buffer.push(record);
    }

    // Act
    let outcome = flush(&buffer, &client);

    // Assert
    assert_eq!(outcome, FlushOutcome::Sent(2));
    assert!(buffer.is_empty());
    match next_client_message(&server).await? {
        ClientMessage::Data { batch, .. } => assert_eq!(batch, records),
        ClientMessage::Stop => panic!("expected data frame"),
    }
    Ok(())
}

#[tokio::test]
async fn test_flush_drops_non_finite_record_and_delivers_the_rest() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let buffer = RecordBuffer::new();
    buffer.push(accel_record(1, 1.0));
    buffer.push(FusedRecord {
        captured_at: 2,
        location: None,
        total_accel: Some(f64::INFINITY),
    });
    buffer.push(location_record(3, f64::NAN, 4.0));
    buffer.push(accel_record(4, 2.0));

    // Act
    let outcome = flush(&buffer, &client);

    // Assert
    assert_eq!(outcome, FlushOutcome::Sent(2));
    assert!(buffer.is_empty());
    let ClientMessage::Data { batch, .. } = next_client_message(&server).await? else {
        panic!("expected data frame");
    };
    assert_eq!(batch, vec![accel_record(1, 1.0), accel_record(4, 2.0)]);
    Ok(())
}

#[tokio::test]
async fn test_flush_of_only_non_finite_records_sends_nothing() {
    let (client, _server) = duplex();
    let buffer = RecordBuffer::new();
    buffer.push(accel_record(1, f64::NAN));

    let outcome = flush(&buffer, &client);

    assert_eq!(outcome, FlushOutcome::SkippedEmpty);
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn test_flush_skips_when_connection_not_ready() {
    // Arrange
    let (client, _server) = duplex();
    client.set_ready_state(ReadyState::Connecting);
    let buffer = RecordBuffer::new();
    buffer.push(accel_record(1, 1.0));

    // Act
    let outcome = flush(&buffer, &client);

    // Assert
    assert_eq!(outcome, FlushOutcome::SkippedNotReady);
    assert_eq!(buffer.len(), 1);
}

#[tokio::test]
async fn test_refused_frame_keeps_records_buffered() {
    // Arrange
    let connection = RefusingConnection {
        attempts: AtomicUsize::new(0),
    };
    let buffer = RecordBuffer::new();
    for record in accel_burst(0, 3) {
        buffer.push(record);
    }

    // Act
    let first = flush(&buffer, &connection);
    let second = flush(&buffer, &connection);

    // Assert
    assert_eq!(first, FlushOutcome::Deferred);
    assert_eq!(second, FlushOutcome::Deferred);
    assert_eq!(connection.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(buffer.snapshot(), accel_burst(0, 3));
}

#[tokio::test(start_paused = true)]
async fn test_timer_flushes_on_interval_only() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let buffer = RecordBuffer::new();
    let config = SenderConfig::default();
    let _sender = BatchSender::start(buffer.clone(), Arc::new(client), config);
    buffer.push(accel_record(1, 9.8));

    // Act & Assert: nothing before the interval elapses
    assert!(
        tokio::time::timeout(Duration::from_secs(29), server.recv_frame())
            .await
            .is_err()
    );

    // Act & Assert: the tick at 30 s sends the batch
    match next_client_message(&server).await? {
        ClientMessage::Data { batch, .. } => assert_eq!(batch, vec![accel_record(1, 9.8)]),
        ClientMessage::Stop => panic!("expected data frame"),
    }
    assert!(buffer.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_records_survive_ticks_while_not_ready() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let client = Arc::new(client);
    client.set_ready_state(ReadyState::Connecting);
    let buffer = RecordBuffer::new();
    let _sender = BatchSender::start(buffer.clone(), client.clone(), SenderConfig::default());
    buffer.push(accel_record(1, 1.0));

    // Act: two ticks pass while connecting
    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(buffer.len(), 1);
    buffer.push(accel_record(2, 2.0));
    client.set_ready_state(ReadyState::Open);

    // Assert: the next tick delivers both, in order
    match next_client_message(&server).await? {
        ClientMessage::Data { batch, .. } => {
            assert_eq!(batch, vec![accel_record(1, 1.0), accel_record(2, 2.0)]);
        }
        ClientMessage::Stop => panic!("expected data frame"),
    }
    Ok(())
}

#[tokio::test]
async fn test_stop_sends_final_batch_then_stop_and_returns_receipt() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let buffer = RecordBuffer::new();
    let mut sender = BatchSender::start(buffer.clone(), Arc::new(client), SenderConfig::default());
    buffer.push(accel_record(100, 1.0));

    let service = tokio::spawn(async move {
        let first = next_client_message(&server).await?;
        let second = next_client_message(&server).await?;
        reply(&server, &stopped(1))?;
        anyhow::Ok((first, second))
    });

    // Act
    let receipt = sender.stop().await?;

    // Assert
    let (first, second) = service.await??;
    assert!(matches!(first, ClientMessage::Data { ref batch, .. } if batch.len() == 1));
    assert_eq!(second, ClientMessage::Stop);
    assert_eq!(receipt.index, 1);
    assert_eq!(receipt.download_url, "/download/1");
    assert!(buffer.is_empty());
    assert!(!sender.is_running());
    Ok(())
}

#[tokio::test]
async fn test_stop_with_empty_buffer_sends_only_stop() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let mut sender = BatchSender::start(RecordBuffer::new(), Arc::new(client), SenderConfig::default());

    let service = tokio::spawn(async move {
        let first = next_client_message(&server).await?;
        reply(&server, &stopped(2))?;
        anyhow::Ok(first)
    });

    // Act
    let receipt = sender.stop().await?;

    // Assert
    assert_eq!(service.await??, ClientMessage::Stop);
    assert_eq!(receipt.index, 2);
    Ok(())
}

#[tokio::test]
async fn test_stop_without_ready_connection_is_fatal_and_keeps_data() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let client = Arc::new(client);
    client.set_ready_state(ReadyState::Closing);
    let buffer = RecordBuffer::new();
    let mut sender = BatchSender::start(buffer.clone(), client.clone(), SenderConfig::default());
    buffer.push(accel_record(1, 1.0));

    // Act
    let err = sender.stop().await.unwrap_err();

    // Assert
    assert!(matches!(err, RideError::ConnectionUnavailable { .. }));
    assert!(err.nothing_saved());
    assert_eq!(buffer.len(), 1);
    assert!(sender.is_running());

    // Act: retry once the link is back
    client.set_ready_state(ReadyState::Open);
    let service = tokio::spawn(async move {
        let _data = next_client_message(&server).await?;
        let _stop = next_client_message(&server).await?;
        reply(&server, &stopped(1))
    });
    let receipt = sender.stop().await?;

    // Assert
    service.await??;
    assert_eq!(receipt.index, 1);
    assert!(buffer.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stop_reports_service_error() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let mut sender = BatchSender::start(RecordBuffer::new(), Arc::new(client), SenderConfig::default());
    let service = tokio::spawn(async move {
        let _stop = next_client_message(&server).await?;
        reply(&server, &ServerMessage::error(&RideError::EmptySession))
    });

    // Act
    let err = sender.stop().await.unwrap_err();

    // Assert
    service.await??;
    assert!(matches!(err, RideError::EmptySession));
    assert!(sender.is_running());
    Ok(())
}

#[tokio::test]
async fn test_stop_skips_live_batches_while_waiting_for_ack() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let mut sender = BatchSender::start(RecordBuffer::new(), Arc::new(client), SenderConfig::default());
    let service = tokio::spawn(async move {
        let _stop = next_client_message(&server).await?;
        reply(
            &server,
            &ServerMessage::Batch {
                payload: serde_json::json!([]),
            },
        )?;
        reply(&server, &stopped(5))
    });

    // Act
    let receipt = sender.stop().await?;

    // Assert
    service.await??;
    assert_eq!(receipt.index, 5);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_times_out_without_ack() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let config = SenderConfig::default().with_ack_timeout(Duration::from_secs(2));
    let mut sender = BatchSender::start(RecordBuffer::new(), Arc::new(client), config);

    // Act
    let err = sender.stop().await.unwrap_err();

    // Assert
    assert!(matches!(err, RideError::Timeout { .. }));
    assert!(!err.nothing_saved());
    assert_eq!(next_client_message(&server).await?, ClientMessage::Stop);
    Ok(())
}

#[tokio::test]
async fn test_flush_now_after_stop_reports_closed() -> anyhow::Result<()> {
    // Arrange
    let (client, server) = duplex();
    let mut sender = BatchSender::start(RecordBuffer::new(), Arc::new(client), SenderConfig::default());
    let service = tokio::spawn(async move {
        let _stop = next_client_message(&server).await?;
        reply(&server, &stopped(1))
    });
    sender.stop().await?;
    service.await??;

    // Act
    let err = sender.flush_now().await.unwrap_err();

    // Assert
    assert!(matches!(err, RideError::ChannelClosed));
    Ok(())
}
