// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use parking_lot::{Mutex, MutexGuard};
use ridestream_core::FusedRecord;
use std::sync::Arc;

/// Shared, append-only buffer of fused records awaiting transmission.
///
/// Unbounded by design: it grows until the next flush drains it. Capping it
/// would drop records, so callers that care about growth watch [`len`].
///
/// [`len`]: RecordBuffer::len
#[derive(Debug, Default, Clone)]
pub struct RecordBuffer {
    records: Arc<Mutex<Vec<FusedRecord>>>,
}

impl RecordBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, record: FusedRecord) {
        self.records.lock().push(record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Copy of the current contents, in arrival order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<FusedRecord> {
        self.records.lock().clone()
    }

    /// Drain everything buffered so far.
    #[must_use]
    pub fn take(&self) -> Vec<FusedRecord> {
        std::mem::take(&mut *self.records.lock())
    }

    /// Exclusive access for a send-then-clear flush.
    ///
    /// Appends from the sources wait while the guard is held, so nothing can
    /// land between encoding the batch and clearing it.
    pub fn lock(&self) -> MutexGuard<'_, Vec<FusedRecord>> {
        self.records.lock()
    }
}
