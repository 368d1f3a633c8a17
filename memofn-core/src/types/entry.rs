//! Cache entries and registry snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{CacheKey, Value};

/// A cached result with its lifecycle metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The cached result, opaque to the store.
    pub value: V,
    /// When the value was computed.
    pub created_at: DateTime<Utc>,
    /// When the value was last returned from the cache.
    pub last_accessed_at: DateTime<Utc>,
    /// Staleness stamp recorded by the policy at write time.
    pub stamp: Option<Value>,
}

impl<V> CacheEntry<V> {
    /// Creates an entry computed at `now`.
    pub fn new(value: V, now: DateTime<Utc>, stamp: Option<Value>) -> Self {
        Self {
            value,
            created_at: now,
            last_accessed_at: now,
            stamp,
        }
    }

    /// Records a cache hit.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
    }

    /// Time elapsed since the value was computed.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Whole days since the value was computed.
    pub fn created_days_ago(&self, now: DateTime<Utc>) -> i64 {
        self.age(now).num_days()
    }

    /// Whole days since the value was last used.
    pub fn used_days_ago(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_accessed_at).num_days()
    }

    /// Returns the metadata a staleness policy looks at.
    pub fn meta(&self) -> EntryMeta {
        EntryMeta {
            created_at: self.created_at,
            last_accessed_at: self.last_accessed_at,
            stamp: self.stamp.clone(),
        }
    }
}

/// Metadata of an entry, detached from its value.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryMeta {
    /// When the value was computed.
    pub created_at: DateTime<Utc>,
    /// When the value was last returned from the cache.
    pub last_accessed_at: DateTime<Utc>,
    /// Stamp recorded at write time.
    pub stamp: Option<Value>,
}

/// How a call was served.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Served from a fresh entry.
    Hit,
    /// No entry existed.
    Miss,
    /// An entry existed but the staleness policy rejected it.
    Stale,
    /// An entry existed but the bypass predicate forced a recompute.
    Bypassed,
}

impl Outcome {
    /// Returns true if the wrapped function ran for this call.
    pub fn computed(self) -> bool {
        !matches!(self, Outcome::Hit)
    }
}

/// Entries of one namespace.
pub type NamespaceSnapshot<V> = HashMap<CacheKey, CacheEntry<V>>;

/// Entries of a whole registry, by namespace name.
pub type Snapshot<V> = HashMap<String, NamespaceSnapshot<V>>;
