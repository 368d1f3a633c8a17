//! Binary snapshot encoding shared by the stores.
//!
//! ```text
//! magic (4 bytes): "MEMO"
//! version (1 byte): 1
//! count (8 bytes, LE): number of namespaces
//! payload (variable): bincode-serialized snapshot
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use memofn_core::constants::{STORE_HEADER_SIZE, STORE_MAGIC, STORE_VERSION};
use memofn_core::error::{MemoError, Result};
use memofn_core::types::Snapshot;

/// Encodes `snapshot` with the store header.
pub fn encode<V: Serialize>(snapshot: &Snapshot<V>) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(snapshot).map_err(|e| MemoError::Serialization(e.to_string()))?;

    let mut contents = Vec::with_capacity(STORE_HEADER_SIZE + payload.len());
    contents.extend_from_slice(STORE_MAGIC);
    contents.push(STORE_VERSION);
    contents.extend_from_slice(&(snapshot.len() as u64).to_le_bytes());
    contents.extend_from_slice(&payload);
    Ok(contents)
}

/// Decodes bytes produced by [`encode`].
pub fn decode<V: DeserializeOwned>(contents: &[u8]) -> Result<Snapshot<V>> {
    if contents.len() < STORE_HEADER_SIZE {
        return Err(MemoError::CorruptStore("File too short".into()));
    }

    if &contents[0..4] != STORE_MAGIC {
        return Err(MemoError::CorruptStore("Invalid magic bytes".into()));
    }

    let version = contents[4];
    if version != STORE_VERSION {
        return Err(MemoError::VersionMismatch {
            expected: STORE_VERSION,
            actual: version,
        });
    }

    let mut count = [0u8; 8];
    count.copy_from_slice(&contents[5..STORE_HEADER_SIZE]);
    let count = u64::from_le_bytes(count);

    let snapshot: Snapshot<V> = bincode::deserialize(&contents[STORE_HEADER_SIZE..])
        .map_err(|e| MemoError::Serialization(e.to_string()))?;

    if snapshot.len() as u64 != count {
        return Err(MemoError::CorruptStore(format!(
            "header announces {} namespaces, payload holds {}",
            count,
            snapshot.len()
        )));
    }

    Ok(snapshot)
}
