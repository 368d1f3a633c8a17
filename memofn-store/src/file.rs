//! File-backed snapshot persistence.
//!
//! Stores a registry snapshot in a single binary file (see [`crate::codec`]).
//! Suitable for caches that must survive process restarts on one machine.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use memofn_core::error::Result;
use memofn_core::traits::CachePersistence;
use memofn_core::types::Snapshot;

use crate::codec;

/// Snapshot persistence in a file.
///
/// Loading a missing file yields an empty snapshot; the file is created on
/// first save. Saves write a temporary sibling and rename it into place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStore {
    /// Path to the storage file
    path: PathBuf,
}

impl FileStore {
    /// Creates a store for `path`. Nothing is read or written yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Path of the temporary file used while saving.
    pub fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    fn read_snapshot<V: DeserializeOwned>(&self) -> Result<Snapshot<V>> {
        if !self.path.exists() {
            debug!("No cache file, starting empty");
            return Ok(Snapshot::new());
        }

        let contents = fs::read(&self.path)?;
        let snapshot = codec::decode(&contents).map_err(|e| {
            warn!(error = %e, "Rejecting cache file");
            e
        })?;

        info!(namespaces = snapshot.len(), "Cache loaded from file");
        Ok(snapshot)
    }

    #[instrument(skip(self, snapshot), fields(path = ?self.path))]
    fn write_snapshot<V: Serialize>(&self, snapshot: &Snapshot<V>) -> Result<()> {
        let contents = codec::encode(snapshot)?;
        info!(namespaces = snapshot.len(), bytes = contents.len(), "Saving cache to file");

        // Write atomically (write to temp, then rename)
        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(&contents)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.path)?;

        debug!("Cache saved successfully");
        Ok(())
    }
}

impl<V> CachePersistence<V> for FileStore
where
    V: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Snapshot<V>> {
        self.read_snapshot()
    }

    fn save(&self, snapshot: &Snapshot<V>) -> Result<()> {
        self.write_snapshot(snapshot)
    }
}
