//! Snapshot persistence behind the store.
//!
//! The store treats persistence as a pluggable collaborator: anything that
//! can hand back the last saved [`SessionCollection`] and accept a new one.
//! Hosts on the desktop use [`JsonFileVault`]; tests and embedded hosts use
//! [`InMemoryVault`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::collection::SessionCollection;

// ─────────────────────────────────────────────────────────────────────────────
// Contract
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault io: {0}")]
    Io(#[from] io::Error),
    #[error("vault encoding: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("vault storage: {0}")]
    Storage(String),
}

/// Persistence contract for session snapshots.
///
/// `load` distinguishes "nothing saved yet" (`Ok(None)`) from a snapshot
/// that exists but cannot be read (`Err`); the store degrades either to a
/// logged-out start, but only the latter is worth a warning.
pub trait SessionVault: Send + Sync {
    fn load(&self) -> Result<Option<SessionCollection>, VaultError>;
    fn save(&self, collection: &SessionCollection) -> Result<(), VaultError>;
}

impl<V: SessionVault + ?Sized> SessionVault for Arc<V> {
    fn load(&self) -> Result<Option<SessionCollection>, VaultError> {
        (**self).load()
    }

    fn save(&self, collection: &SessionCollection) -> Result<(), VaultError> {
        (**self).save(collection)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory vault
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryInner {
    snapshot: Option<SessionCollection>,
    saves: u64,
}

/// Vault that keeps the snapshot in process memory. Never fails.
#[derive(Default)]
pub struct InMemoryVault {
    inner: RwLock<MemoryInner>,
}

impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Vault pre-populated with a snapshot, as if a previous run saved it.
    pub fn seeded(snapshot: SessionCollection) -> Arc<Self> {
        let vault = Self::new();
        vault.inner.write().snapshot = Some(snapshot);
        Arc::new(vault)
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> u64 {
        self.inner.read().saves
    }
}

impl SessionVault for InMemoryVault {
    fn load(&self) -> Result<Option<SessionCollection>, VaultError> {
        Ok(self.inner.read().snapshot.clone())
    }

    fn save(&self, collection: &SessionCollection) -> Result<(), VaultError> {
        let mut inner = self.inner.write();
        inner.snapshot = Some(collection.clone());
        inner.saves += 1;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON file vault
// ─────────────────────────────────────────────────────────────────────────────

/// Vault that persists the snapshot as pretty-printed JSON on disk.
///
/// Saves write a sibling `.tmp` file and rename it over the target, so a
/// crash mid-write leaves the previous snapshot intact rather than a
/// truncated file.
pub struct JsonFileVault {
    path: PathBuf,
}

impl JsonFileVault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl SessionVault for JsonFileVault {
    fn load(&self) -> Result<Option<SessionCollection>, VaultError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, collection: &SessionCollection) -> Result<(), VaultError> {
        let bytes = serde_json::to_vec_pretty(collection)?;
        let staging = self.staging_path();
        fs::write(&staging, &bytes)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
