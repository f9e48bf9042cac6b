// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Append-only storage of export artifacts, keyed by session index.

use parking_lot::RwLock;
use ridestream_core::{ExportArtifact, RideError, Result, ResultExt, SessionIndex};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Durable home of finished rides.
///
/// Artifacts are immutable: once `put` succeeded for an index, every later
/// `get` returns the same bytes and no second `put` for that index succeeds.
pub trait ExportStore: Send + Sync {
    /// Persist `artifact` under `index`.
    ///
    /// Either the whole artifact becomes visible or nothing does.
    ///
    /// # Errors
    /// Returns [`RideError::StorageWriteFailure`] if the write fails or the
    /// index is already taken.
    fn put(&self, index: SessionIndex, artifact: &ExportArtifact) -> Result<()>;

    /// CSV bytes of the artifact stored under `index`.
    ///
    /// # Errors
    /// Returns [`RideError::NotFound`] if nothing is stored there.
    fn get(&self, index: SessionIndex) -> Result<Arc<Vec<u8>>>;

    fn contains(&self, index: SessionIndex) -> bool;

    /// Up to `n` stored indices, newest first.
    fn recent(&self, n: usize) -> Vec<SessionIndex>;

    /// Highest index stored so far.
    fn latest(&self) -> Option<SessionIndex> {
        self.recent(1).first().copied()
    }

    /// Lowest index that was never handed to a successful `put`.
    fn next_free(&self) -> SessionIndex {
        self.latest().map_or(SessionIndex::FIRST, SessionIndex::next)
    }
}

const HIGH_WATER_FILE: &str = ".next_index";

fn already_exists(index: SessionIndex) -> RideError {
    RideError::storage(format!("artifact {} already exists", index.file_name()))
}

/// Artifacts kept in process memory.
#[derive(Default)]
pub struct MemoryExportStore {
    artifacts: RwLock<BTreeMap<SessionIndex, Arc<Vec<u8>>>>,
}

impl MemoryExportStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }
}

impl ExportStore for MemoryExportStore {
    fn put(&self, index: SessionIndex, artifact: &ExportArtifact) -> Result<()> {
        let bytes = artifact.to_csv()?;
        match self.artifacts.write().entry(index) {
            Entry::Occupied(_) => Err(already_exists(index)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(bytes));
                Ok(())
            }
        }
    }

    fn get(&self, index: SessionIndex) -> Result<Arc<Vec<u8>>> {
        self.artifacts
            .read()
            .get(&index)
            .cloned()
            .ok_or(RideError::not_found(index.0))
    }

    fn contains(&self, index: SessionIndex) -> bool {
        self.artifacts.read().contains_key(&index)
    }

    fn recent(&self, n: usize) -> Vec<SessionIndex> {
        self.artifacts.read().keys().rev().take(n).copied().collect()
    }
}

/// One `ride_<n>.csv` file per session in a directory.
///
/// Each artifact is written to a temporary file in the same directory,
/// synced, and then linked into place only if no file of that name exists.
/// After every successful `put` the next free index is recorded in
/// `.next_index`, so numbering survives artifacts deleted by hand.
pub struct FsExportStore {
    dir: PathBuf,
}

impl FsExportStore {
    /// Use `dir`, creating it if needed.
    ///
    /// # Errors
    /// Returns [`RideError::StorageWriteFailure`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_of(&self, index: SessionIndex) -> PathBuf {
        self.dir.join(index.file_name())
    }

    fn high_water_path(&self) -> PathBuf {
        self.dir.join(HIGH_WATER_FILE)
    }

    fn high_water(&self) -> Option<SessionIndex> {
        let text = match fs::read_to_string(self.high_water_path()) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                crate::warn!("cannot read {}: {}", HIGH_WATER_FILE, e);
                return None;
            }
        };
        match text.trim().parse() {
            Ok(next) => Some(SessionIndex(next)),
            Err(e) => {
                crate::warn!("ignoring malformed {}: {}", HIGH_WATER_FILE, e);
                None
            }
        }
    }

    fn raise_high_water(&self, next: SessionIndex) -> Result<()> {
        if self.high_water().is_some_and(|current| current >= next) {
            return Ok(());
        }
        let mut staged = tempfile::Builder::new()
            .prefix(".next_index-")
            .suffix(".partial")
            .tempfile_in(&self.dir)
            .context("staging index mark")?;
        write!(staged, "{}", next.0).context("writing index mark")?;
        staged.as_file().sync_all().context("syncing index mark")?;
        staged
            .persist(self.high_water_path())
            .map_err(|e| RideError::storage_caused_by("publishing index mark", e.error))?;
        Ok(())
    }

    fn index_of(file_name: &str) -> Option<SessionIndex> {
        let external = file_name.strip_prefix("ride_")?.strip_suffix(".csv")?;
        SessionIndex::from_external(external.parse().ok()?)
    }
}

impl ExportStore for FsExportStore {
    fn put(&self, index: SessionIndex, artifact: &ExportArtifact) -> Result<()> {
        let bytes = artifact.to_csv()?;
        let target = self.path_of(index);
        if target.exists() {
            return Err(already_exists(index));
        }

        let mut staged = tempfile::Builder::new()
            .prefix(".ride-")
            .suffix(".partial")
            .tempfile_in(&self.dir)
            .context("staging artifact")?;
        staged.write_all(&bytes).context("writing artifact")?;
        staged.as_file().sync_all().context("syncing artifact")?;

        staged.persist_noclobber(&target).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                already_exists(index)
            } else {
                RideError::storage_caused_by(format!("publishing {}", target.display()), e.error)
            }
        })?;
        crate::debug!("artifact written to {}", target.display());
        if let Err(e) = self.raise_high_water(index.next()) {
            crate::warn!("{} saved but index mark not updated: {}", index.file_name(), e);
        }
        Ok(())
    }

    fn get(&self, index: SessionIndex) -> Result<Arc<Vec<u8>>> {
        match fs::read(self.path_of(index)) {
            Ok(bytes) => Ok(Arc::new(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(RideError::not_found(index.0)),
            Err(e) => Err(RideError::storage_caused_by(
                format!("reading {}", index.file_name()),
                e,
            )),
        }
    }

    fn contains(&self, index: SessionIndex) -> bool {
        self.path_of(index).is_file()
    }

    fn recent(&self, n: usize) -> Vec<SessionIndex> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                crate::warn!("cannot list {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };

        let mut indices: Vec<SessionIndex> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| Self::index_of(entry.file_name().to_str()?))
            .collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.truncate(n);
        indices
    }

    fn next_free(&self) -> SessionIndex {
        let after_latest = self
            .latest()
            .map_or(SessionIndex::FIRST, SessionIndex::next);
        self.high_water().map_or(after_latest, |mark| mark.max(after_latest))
    }
}
