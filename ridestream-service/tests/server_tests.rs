// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use ridestream_core::{encode_data_frame, encode_stop_frame, ServerMessage};
use ridestream_sender::{duplex, ClientConnection, Connection};
use ridestream_service::{serve_connection, serve_observer, Service};
use ridestream_test_utils::helpers::wait_until;
use ridestream_test_utils::test_data::{accel_burst, accel_record, location_record};
use std::time::Duration;

async fn next_server_message(client: &ClientConnection) -> anyhow::Result<ServerMessage> {
    let frame = tokio::time::timeout(Duration::from_secs(5), client.recv_frame()).await??;
    Ok(ServerMessage::decode(&frame)?)
}

fn connect(service: &Service) -> ClientConnection {
    let (client, server) = duplex();
    tokio::spawn(serve_connection(service.clone(), server));
    client
}

#[tokio::test]
async fn test_data_then_stop_produces_stopped_frame() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let client = connect(&service);
    let records = vec![accel_record(100, 1.0), location_record(150, 1.0, 2.0)];

    // Act
    client.send_frame(encode_data_frame(&records)?)?;
    client.send_frame(encode_stop_frame())?;
    let reply = next_server_message(&client).await?;

    // Assert
    let ServerMessage::Stopped { index, download_url, .. } = reply else {
        panic!("expected stopped frame, got {reply:?}");
    };
    assert_eq!(index, 1);
    assert_eq!(download_url, "/download/1");
    assert_eq!(
        std::str::from_utf8(&service.export_external(1)?)?,
        "timestamp,latitude,longitude,total_accel\n100,,,1\n150,1,2,\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_stop_without_data_answers_empty_session() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let client = connect(&service);

    // Act
    client.send_frame(encode_stop_frame())?;
    let reply = next_server_message(&client).await?;

    // Assert
    assert_eq!(
        reply,
        ServerMessage::Error {
            kind: "empty_session".to_string(),
            message: "Nothing was saved: the current session has no records".to_string(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_frames_get_error_and_connection_survives() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let client = connect(&service);

    // Act
    client.send_frame("not json".to_string())?;
    let protocol = next_server_message(&client).await?;
    client.send_frame(r#"{"type":"data","payload":{"capturedAt":1}}"#.to_string())?;
    let payload = next_server_message(&client).await?;
    client.send_frame(encode_data_frame(&accel_burst(0, 2))?)?;
    client.send_frame(encode_stop_frame())?;
    let stopped = next_server_message(&client).await?;

    // Assert
    assert!(matches!(protocol, ServerMessage::Error { ref kind, .. } if kind == "protocol"));
    assert!(matches!(payload, ServerMessage::Error { ref kind, .. } if kind == "invalid_payload"));
    assert!(matches!(stopped, ServerMessage::Stopped { index: 1, .. }));
    Ok(())
}

#[tokio::test]
async fn test_observer_receives_batches_from_other_client() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let (observer, observer_server) = duplex();
    tokio::spawn(serve_observer(service.clone(), observer_server));
    wait_until(|| service.observers().observer_count() == 1, 1000).await;
    let client = connect(&service);
    let records = accel_burst(0, 3);
    let frame = encode_data_frame(&records)?;

    // Act
    client.send_frame(frame.clone())?;
    let pushed = next_server_message(&observer).await?;

    // Assert
    let sent: serde_json::Value = serde_json::from_str(&frame)?;
    assert_eq!(
        pushed,
        ServerMessage::Batch {
            payload: sent["payload"].clone()
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_closing_client_ends_serve_loop() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let (client, server) = duplex();
    let handle = tokio::spawn(serve_connection(service, server));

    // Act
    drop(client);

    // Assert
    tokio::time::timeout(Duration::from_secs(5), handle).await??;
    Ok(())
}
