//! A named, isolated sub-cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use memofn_core::error::MemoError;
use memofn_core::traits::{Clock, StalenessPolicy};
use memofn_core::types::{Args, CacheEntry, CacheKey, EntryMeta, NamespaceSnapshot, Outcome};

use crate::memo::BypassFn;

/// Everything a lookup needs besides the key and the arguments.
pub struct Lookup<'a> {
    /// Decides whether an existing entry is stale.
    pub policy: &'a dyn StalenessPolicy,
    /// Forces a recompute when it returns true. Checked before the policy.
    pub bypass: Option<&'a BypassFn>,
    /// Source of timestamps.
    pub clock: &'a dyn Clock,
    /// Serialize concurrent lookups of the same key.
    pub compute_once: bool,
}

/// Mapping from cache keys to entries, plus hit/miss counters.
///
/// Thread-safe. At most one entry exists per key.
pub struct Namespace<V> {
    name: String,
    entries: RwLock<HashMap<CacheKey, CacheEntry<V>>>,
    key_locks: DashMap<CacheKey, Arc<Mutex<()>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    bypassed: AtomicU64,
}

impl<V> Namespace<V> {
    /// Creates an empty namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
            key_locks: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            bypassed: AtomicU64::new(0),
        }
    }

    /// Returns the namespace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the metadata of the entry at `key`, without touching it.
    pub fn meta(&self, key: &CacheKey) -> Option<EntryMeta> {
        self.entries.read().get(key).map(CacheEntry::meta)
    }

    /// Returns true if an entry exists at `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Stores `entry` at `key`, replacing any previous entry.
    pub fn insert(&self, key: CacheKey, entry: CacheEntry<V>) {
        self.entries.write().insert(key, entry);
    }

    /// Removes the entry at `key`.
    pub fn remove(&self, key: &CacheKey) -> Option<CacheEntry<V>> {
        self.entries.write().remove(key)
    }

    /// Removes all entries. Counters are kept.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Keeps only the entries for which `keep` returns true.
    /// Returns how many were removed.
    pub fn retain(&self, mut keep: impl FnMut(&CacheKey, &CacheEntry<V>) -> bool) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|k, e| keep(k, e));
        before - entries.len()
    }

    /// Removes entries created more than `max_age` before `now`.
    pub fn evict_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> usize {
        self.retain(|_, e| e.age(now) <= max_age)
    }

    /// Removes entries whose metadata `expired` accepts. Returns how many
    /// were removed.
    ///
    /// `expired` runs on copies without the namespace lock held. An entry
    /// rewritten in the meantime is kept.
    pub fn evict_where(&self, mut expired: impl FnMut(&EntryMeta) -> bool) -> usize {
        let candidates: Vec<(CacheKey, EntryMeta)> = self
            .entries
            .read()
            .iter()
            .map(|(k, e)| (k.clone(), e.meta()))
            .collect();
        let doomed: Vec<(CacheKey, DateTime<Utc>)> = candidates
            .into_iter()
            .filter(|(_, meta)| expired(meta))
            .map(|(k, meta)| (k, meta.created_at))
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write();
        let mut removed = 0;
        for (key, created_at) in doomed {
            if entries.get(&key).is_some_and(|e| e.created_at == created_at) {
                entries.remove(&key);
                removed += 1;
            }
        }
        debug!(namespace = %self.name, removed, "evicted entries");
        removed
    }

    /// Replaces all entries with `entries`.
    pub fn replace(&self, entries: NamespaceSnapshot<V>) {
        *self.entries.write() = entries;
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the current keys.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.read().keys().cloned().collect()
    }

    /// Returns counters and size.
    pub fn stats(&self) -> NamespaceStats {
        NamespaceStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Hit => &self.hits,
            Outcome::Miss => &self.misses,
            Outcome::Stale => &self.stale,
            Outcome::Bypassed => &self.bypassed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl<V: Clone> Namespace<V> {
    /// Returns a copy of the entry at `key`, without touching it.
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry<V>> {
        self.entries.read().get(key).cloned()
    }

    /// Records a hit on `key` at `now` and returns a copy of its value.
    pub fn touch(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<V> {
        let mut entries = self.entries.write();
        let entry = entries.get_mut(key)?;
        entry.touch(now);
        Some(entry.value.clone())
    }

    /// Copies all entries.
    pub fn snapshot(&self) -> NamespaceSnapshot<V> {
        self.entries.read().clone()
    }

    /// Returns the value at `key`, computing and storing it if the entry is
    /// missing, stale, or bypassed.
    ///
    /// `compute` runs without any namespace lock held. When it fails nothing
    /// is written. With `compute_once`, concurrent callers of the same key
    /// wait for the first one instead of computing again.
    pub fn resolve<E, F>(
        &self,
        key: CacheKey,
        args: &Args,
        lookup: &Lookup<'_>,
        compute: F,
    ) -> Result<(V, Outcome), E>
    where
        E: From<MemoError>,
        F: FnOnce() -> Result<V, E>,
    {
        if !lookup.compute_once {
            return self.resolve_unlocked(key, args, lookup, compute);
        }

        let key_lock = Arc::clone(&*self.key_locks.entry(key.clone()).or_insert_with(Default::default));
        let result = {
            let _guard = key_lock.lock();
            self.resolve_unlocked(key.clone(), args, lookup, compute)
        };
        // Map and this handle are the only owners: nobody else is waiting.
        self.key_locks.remove_if(&key, |_, lock| Arc::strong_count(lock) == 2);
        result
    }

    fn resolve_unlocked<E, F>(
        &self,
        key: CacheKey,
        args: &Args,
        lookup: &Lookup<'_>,
        compute: F,
    ) -> Result<(V, Outcome), E>
    where
        E: From<MemoError>,
        F: FnOnce() -> Result<V, E>,
    {
        let now = lookup.clock.now();
        // Before the callable: a failing stamp must not waste a run.
        let current = lookup.policy.current_stamp(args, now)?;
        let mut outcome = match self.meta(&key) {
            None => Outcome::Miss,
            Some(meta) => {
                if lookup.bypass.is_some_and(|bypass| bypass(args)) {
                    Outcome::Bypassed
                } else if lookup.policy.is_stale(&meta, current.as_ref(), now)? {
                    Outcome::Stale
                } else {
                    Outcome::Hit
                }
            }
        };

        if outcome == Outcome::Hit {
            if let Some(value) = self.touch(&key, now) {
                self.record(outcome);
                trace!(namespace = %self.name, key = %key, "cache hit");
                return Ok((value, outcome));
            }
            // Removed between the check and the touch.
            outcome = Outcome::Miss;
        }

        self.record(outcome);
        debug!(namespace = %self.name, ?outcome, "computing value");

        let value = compute()?;
        let stored_at = lookup.clock.now();
        let stamp = lookup.policy.stored_stamp(args, current)?;
        self.insert(key, CacheEntry::new(value.clone(), stored_at, stamp));

        Ok((value, outcome))
    }
}

/// Namespace counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceStats {
    /// Entries currently stored.
    pub entries: usize,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups with no entry.
    pub misses: u64,
    /// Lookups whose entry was stale.
    pub stale: u64,
    /// Lookups forced to recompute by the bypass predicate.
    pub bypassed: u64,
}

impl NamespaceStats {
    /// Total lookups.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses + self.stale + self.bypassed
    }

    /// Fraction of lookups served from the cache, `0.0` with no lookups.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }
}
