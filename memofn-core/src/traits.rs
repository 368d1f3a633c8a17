//! Common traits for memofn.
//!
//! These are the seams between the memo store and its collaborators:
//! time, staleness decisions, and persistence.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{Args, EntryMeta, Snapshot, Value};

// ═══════════════════════════════════════════════════════════════════════════════
// CLOCK TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Source of the current time for entry timestamps and age checks.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// STALENESS TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Decides whether an existing entry must be recomputed.
///
/// Implementations might use:
/// - The entry's age (expire after N days)
/// - A stamp stored with the entry, such as a digest of an input file,
///   compared against a freshly computed one
pub trait StalenessPolicy: Send + Sync {
    /// Stamp describing the call's inputs as they are now.
    ///
    /// Computed once per lookup, before the wrapped callable runs, and
    /// handed to [`is_stale`](Self::is_stale) and
    /// [`stored_stamp`](Self::stored_stamp).
    fn current_stamp(&self, _args: &Args, _now: DateTime<Utc>) -> Result<Option<Value>> {
        Ok(None)
    }

    /// Stamp to store with a freshly computed entry. Runs after the
    /// callable; defaults to the current stamp.
    fn stored_stamp(&self, _args: &Args, current: Option<Value>) -> Result<Option<Value>> {
        Ok(current)
    }

    /// Returns true if the entry described by `entry` must be recomputed,
    /// given the `current` stamp of the call.
    fn is_stale(&self, entry: &EntryMeta, current: Option<&Value>, now: DateTime<Utc>) -> Result<bool>;

    /// Returns true if the entry is stale whatever the arguments of a
    /// future call. Drives eviction of entries nobody asks for.
    fn is_evictable(&self, _entry: &EntryMeta, _now: DateTime<Utc>) -> bool {
        false
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PERSISTENCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Loads and saves registry snapshots.
///
/// The encoding is owned by the implementation. Saving then loading must
/// reconstruct an equal snapshot.
pub trait CachePersistence<V>: Send + Sync {
    /// Reads the persisted snapshot. A missing source yields an empty one.
    fn load(&self) -> Result<Snapshot<V>>;

    /// Writes `snapshot`, replacing whatever was persisted before.
    fn save(&self, snapshot: &Snapshot<V>) -> Result<()>;
}
