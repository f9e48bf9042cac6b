// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::{
    ExportStore, FinalizedSession, FsExportStore, IngestReceipt, MemoryExportStore, ObserverHub,
    ServiceConfig, SessionFinalizer, SessionIngress, SessionState, SessionStatusView,
};
use futures::stream::BoxStream;
use ridestream_core::{Batch, FusedRecord, RideError, Result, SessionIndex};
use serde_json::Value;
use std::sync::Arc;

/// One collection service: the open session, its observers and the store.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Service {
    config: ServiceConfig,
    state: Arc<SessionState>,
    observers: ObserverHub,
    store: Arc<dyn ExportStore>,
    ingress: SessionIngress,
    finalizer: SessionFinalizer,
}

impl Service {
    /// Serve sessions into `store`.
    ///
    /// Numbering continues at the store's first never-used index.
    #[must_use]
    pub fn new(store: Arc<dyn ExportStore>, config: ServiceConfig) -> Self {
        let first = store.next_free();
        let state = Arc::new(SessionState::starting_at(first));
        let observers = ObserverHub::new();

        Self {
            ingress: SessionIngress::new(Arc::clone(&state), observers.clone()),
            finalizer: SessionFinalizer::new(Arc::clone(&state), Arc::clone(&store)),
            config,
            state,
            observers,
            store,
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryExportStore::new()), ServiceConfig::default())
    }

    /// Build the store named by `config`.
    ///
    /// # Errors
    /// Returns [`RideError::StorageWriteFailure`] if the export directory
    /// cannot be created.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let store: Arc<dyn ExportStore> = match &config.export_dir {
            Some(dir) => Arc::new(FsExportStore::open(dir)?),
            None => Arc::new(MemoryExportStore::new()),
        };
        Ok(Self::new(store, config))
    }

    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[must_use]
    pub fn ingress(&self) -> &SessionIngress {
        &self.ingress
    }

    #[must_use]
    pub fn finalizer(&self) -> &SessionFinalizer {
        &self.finalizer
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ExportStore> {
        &self.store
    }

    /// # Errors
    /// See [`SessionIngress::ingest`].
    pub fn ingest(&self, batch: Batch) -> Result<IngestReceipt> {
        self.ingress.ingest(batch)
    }

    /// # Errors
    /// See [`SessionIngress::ingest_json`].
    pub fn ingest_json(&self, payload: Value) -> Result<IngestReceipt> {
        self.ingress.ingest_json(payload)
    }

    /// # Errors
    /// See [`SessionIngress::ingest_body`].
    pub fn ingest_body(&self, body: &str) -> Result<IngestReceipt> {
        self.ingress.ingest_body(body)
    }

    /// # Errors
    /// See [`SessionFinalizer::finalize`].
    pub fn finalize(&self) -> Result<FinalizedSession> {
        self.finalizer.finalize()
    }

    /// CSV bytes of a finalized session.
    ///
    /// # Errors
    /// Returns [`RideError::NotFound`] if the session has no artifact.
    pub fn export(&self, index: SessionIndex) -> Result<Arc<Vec<u8>>> {
        self.store.get(index)
    }

    /// CSV bytes by 1-based session number.
    ///
    /// # Errors
    /// Returns [`RideError::NotFound`] for `0` or a number with no artifact.
    pub fn export_external(&self, external: u64) -> Result<Arc<Vec<u8>>> {
        let index = SessionIndex::from_external(external).ok_or(RideError::not_found(0))?;
        self.export(index)
    }

    /// Up to `n` finalized sessions, newest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<SessionIndex> {
        self.store.recent(n)
    }

    #[must_use]
    pub fn download_url(&self, index: SessionIndex) -> String {
        self.config.download_url(index)
    }

    /// Live `batch` frames for a passive observer.
    pub fn observe(&self) -> BoxStream<'static, String> {
        self.observers.subscribe()
    }

    #[must_use]
    pub fn observers(&self) -> &ObserverHub {
        &self.observers
    }

    /// Records of the open session.
    #[must_use]
    pub fn snapshot(&self) -> Vec<FusedRecord> {
        self.state.snapshot()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatusView {
        self.state.status()
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::in_memory()
    }
}
