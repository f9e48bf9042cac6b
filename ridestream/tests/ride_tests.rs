// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use ridestream::endpoints::get_export;
use ridestream::prelude::*;
use ridestream::{serve_observer, RideSummary};
use ridestream_test_utils::helpers::wait_until;
use ridestream_test_utils::test_data::{bump, location, park_entrance, park_pond};
use std::sync::Arc;
use std::time::Duration;

fn connect(service: &Service) -> ridestream::ClientConnection {
    let (client, server) = duplex();
    tokio::spawn(serve_connection(service.clone(), server));
    client
}

#[tokio::test]
async fn test_recorded_ride_ends_up_as_csv_on_service() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let gps = ChannelSource::new();
    let imu = ChannelSource::new();
    let mut recorder = RideRecorder::start(
        &gps,
        &imu,
        Arc::new(connect(&service)),
        SenderConfig::default(),
    );

    // Act
    imu.push(bump(1.0, 100));
    wait_until(|| recorder.pending() == 1, 1000).await;
    gps.push(location(1.0, 2.0, 150));
    wait_until(|| recorder.pending() == 2, 1000).await;
    let receipt = recorder.stop().await?;

    // Assert
    assert_eq!(receipt.index, 1);
    assert_eq!(receipt.download_url, "/download/1");
    let response = get_export(&service, receipt.index);
    assert_eq!(response.status, 200);
    assert_eq!(
        response.body_bytes(),
        b"timestamp,latitude,longitude,total_accel\n100,,,1\n150,1,2,\n".to_vec()
    );
    Ok(())
}

#[tokio::test]
async fn test_mid_ride_flushes_accumulate_into_one_session() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let gps = ChannelSource::new();
    let imu = ChannelSource::new();
    let mut recorder = RideRecorder::start(
        &gps,
        &imu,
        Arc::new(connect(&service)),
        SenderConfig::default(),
    );

    // Act
    gps.push(park_entrance());
    imu.push(bump(2.0, 1_020));
    wait_until(|| recorder.pending() == 2, 1000).await;
    recorder.flush_now().await?;
    wait_until(|| service.status().open_count == 2, 1000).await;

    gps.push(park_pond());
    imu.push(bump(4.0, 2_020));
    wait_until(|| recorder.pending() == 2, 1000).await;
    let receipt = recorder.stop().await?;

    // Assert
    assert_eq!(service.status().open_count, 0);
    let csv = service.export_external(receipt.index)?;
    let text = std::str::from_utf8(&csv)?;
    assert_eq!(text.lines().count(), 5);
    Ok(())
}

#[tokio::test]
async fn test_second_ride_gets_next_index() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let mut indices = Vec::new();

    // Act
    for ride in 0..2u64 {
        let gps = ChannelSource::<LocationReading>::new();
        let imu = ChannelSource::new();
        let mut recorder = RideRecorder::start(
            &gps,
            &imu,
            Arc::new(connect(&service)),
            SenderConfig::default(),
        );
        imu.push(bump(1.5, ride * 10_000));
        wait_until(|| recorder.pending() == 1, 1000).await;
        indices.push(recorder.stop().await?.index);
    }

    // Assert
    assert_eq!(indices, vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn test_stop_of_empty_ride_saves_nothing() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let gps = ChannelSource::<LocationReading>::new();
    let imu = ChannelSource::<MotionSample>::new();
    let mut recorder = RideRecorder::start(
        &gps,
        &imu,
        Arc::new(connect(&service)),
        SenderConfig::default(),
    );

    // Act
    let err = recorder.stop().await.unwrap_err();

    // Assert
    assert!(matches!(err, RideError::EmptySession));
    assert!(service.recent(1).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_observer_watches_ride_live() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    let (observer, observer_server) = duplex();
    tokio::spawn(serve_observer(service.clone(), observer_server));
    wait_until(|| service.observers().observer_count() == 1, 1000).await;

    let gps = ChannelSource::<LocationReading>::new();
    let imu = ChannelSource::new();
    let recorder = RideRecorder::start(
        &gps,
        &imu,
        Arc::new(connect(&service)),
        SenderConfig::default(),
    );
    imu.push(bump(3.0, 10));
    wait_until(|| recorder.pending() == 1, 1000).await;

    // Act
    recorder.flush_now().await?;
    let frame = tokio::time::timeout(Duration::from_secs(5), observer.recv_frame()).await??;

    // Assert
    assert!(frame.starts_with(r#"{"type":"batch""#));
    assert!(frame.contains(r#""totalAccel":3.0"#));
    Ok(())
}

#[test]
fn test_summary_of_finalized_ride() -> anyhow::Result<()> {
    // Arrange
    let service = Service::in_memory();
    service.ingest_body(
        r#"[{"capturedAt":1,"totalAccel":2.0},{"capturedAt":2,"totalAccel":4.0},
            {"capturedAt":3,"location":{"lat":1.0,"lon":2.0}}]"#,
    )?;

    // Act
    let finalized = service.finalize()?;

    // Assert
    assert_eq!(
        finalized.summary,
        RideSummary {
            count: 2,
            mean: Some(3.0),
            max: Some(4.0),
            min: Some(2.0),
        }
    );
    Ok(())
}
