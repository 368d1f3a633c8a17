//! In-memory snapshot persistence.
//!
//! Keeps the encoded bytes of the last saved snapshot. Useful in tests and
//! for handing a cache between registries in one process.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use memofn_core::error::Result;
use memofn_core::traits::CachePersistence;
use memofn_core::types::Snapshot;

use crate::codec;

/// Snapshot persistence in a byte buffer.
///
/// Snapshots go through the same encoding as [`crate::FileStore`], so a
/// value type that round-trips here round-trips on disk too.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Encoded snapshot; `None` until the first save
    contents: Mutex<Option<Vec<u8>>>,
    /// Number of completed saves
    saves: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding previously encoded bytes.
    pub fn from_bytes(contents: Vec<u8>) -> Self {
        Self {
            contents: Mutex::new(Some(contents)),
            saves: AtomicU64::new(0),
        }
    }

    /// Returns a copy of the encoded snapshot, if any.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.contents.lock().clone()
    }

    /// Returns true if nothing was saved yet.
    pub fn is_empty(&self) -> bool {
        self.contents.lock().is_none()
    }

    /// Number of saves since creation.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }
}

impl<V> CachePersistence<V> for MemoryStore
where
    V: Serialize + DeserializeOwned,
{
    #[instrument(skip(self))]
    fn load(&self) -> Result<Snapshot<V>> {
        match self.contents.lock().as_deref() {
            Some(contents) => codec::decode(contents),
            None => Ok(Snapshot::new()),
        }
    }

    #[instrument(skip_all)]
    fn save(&self, snapshot: &Snapshot<V>) -> Result<()> {
        let contents = codec::encode(snapshot)?;
        debug!(bytes = contents.len(), "Snapshot stored in memory");
        *self.contents.lock() = Some(contents);
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
