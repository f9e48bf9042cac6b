// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{RecordBuffer, SampleSource, Subscription};
use futures::future;
use futures::stream::{self, Stream, StreamExt};
use parking_lot::Mutex;
use ridestream_core::{FusedRecord, LocationReading, MotionReading, MotionSample};
use std::sync::Arc;

/// One event from either source, as it arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    Location(LocationReading),
    Motion(MotionSample),
}

/// Carry-forward state shared by every form of the fusion operator.
///
/// Holds the last location seen. Location events replace it and are emitted
/// as location-only records; motion events are emitted with the location
/// held at that moment, never with one that arrives later. Readings with a
/// NaN or infinite value are dropped and leave the state untouched.
#[derive(Debug, Default, Clone)]
pub struct Fusion {
    last_known_location: Option<LocationReading>,
}

impl Fusion {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_known_location: None,
        }
    }

    #[must_use]
    pub const fn last_known_location(&self) -> Option<LocationReading> {
        self.last_known_location
    }

    pub fn apply(&mut self, event: SensorEvent) -> Option<FusedRecord> {
        let record = match event {
            SensorEvent::Location(location) => FusedRecord::location_update(location),
            SensorEvent::Motion(sample) => {
                FusedRecord::motion(MotionReading::from(sample), self.last_known_location)
            }
        };
        if !record.is_finite() {
            crate::warn!("dropping non-finite reading captured at {}", record.captured_at);
            return None;
        }
        if let SensorEvent::Location(location) = event {
            self.last_known_location = Some(location);
        }
        Some(record)
    }
}

/// Merge a location stream and a motion stream into fused records.
///
/// Output follows the order in which the merged stream yields events. No
/// sorting by capture time happens, so a motion record may carry a
/// `captured_at` earlier than a location record emitted before it.
pub fn fuse<L, M>(locations: L, motions: M) -> impl Stream<Item = FusedRecord>
where
    L: Stream<Item = LocationReading>,
    M: Stream<Item = MotionSample>,
{
    let events = stream::select(
        locations.map(SensorEvent::Location),
        motions.map(SensorEvent::Motion),
    );
    let mut fusion = Fusion::new();
    events.filter_map(move |event| future::ready(fusion.apply(event)))
}

/// Session-scoped fuser: source callbacks in, [`RecordBuffer`] out.
///
/// Each callback applies the carry-forward rule and appends to the buffer
/// under one lock, so buffer order equals the order the callbacks ran in.
#[derive(Debug, Clone, Default)]
pub struct StreamFuser {
    fusion: Arc<Mutex<Fusion>>,
    buffer: RecordBuffer,
}

impl StreamFuser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The output buffer drained by the batch sender.
    #[must_use]
    pub fn buffer(&self) -> &RecordBuffer {
        &self.buffer
    }

    pub fn on_location(&self, reading: LocationReading) {
        self.on_event(SensorEvent::Location(reading));
    }

    pub fn on_motion(&self, sample: MotionSample) {
        self.on_event(SensorEvent::Motion(sample));
    }

    pub fn on_event(&self, event: SensorEvent) {
        let mut fusion = self.fusion.lock();
        if let Some(record) = fusion.apply(event) {
            self.buffer.push(record);
        }
    }

    #[must_use]
    pub fn last_known_location(&self) -> Option<LocationReading> {
        self.fusion.lock().last_known_location()
    }

    /// Subscribe both sources; every reading is fused as it arrives.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach<L, M>(&self, locations: &L, motions: &M) -> SourceSubscriptions
    where
        L: SampleSource<Reading = LocationReading>,
        M: SampleSource<Reading = MotionSample>,
    {
        let location = {
            let fuser = self.clone();
            locations.subscribe(move |reading| fuser.on_location(reading))
        };
        let motion = {
            let fuser = self.clone();
            motions.subscribe(move |sample| fuser.on_motion(sample))
        };
        crate::debug!("location and motion sources attached");

        SourceSubscriptions { location, motion }
    }
}

/// Both source subscriptions of one recording.
pub struct SourceSubscriptions {
    location: Subscription,
    motion: Subscription,
}

impl SourceSubscriptions {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.location.is_active() && self.motion.is_active()
    }

    /// Release both sources and wait for their last callbacks.
    pub async fn unsubscribe(self) {
        self.location.unsubscribe().await;
        self.motion.unsubscribe().await;
        crate::debug!("location and motion sources released");
    }
}
