//! Registry of namespaces.
//!
//! Replaces a process-wide cache with an explicit object: construct it at
//! startup, hand it to every wrapper that should share it, optionally
//! persist and reload it, and drop it at shutdown.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info, instrument};

use memofn_core::error::Result;
use memofn_core::traits::CachePersistence;
use memofn_core::types::Snapshot;

use crate::namespace::Namespace;

/// Namespace name → namespace.
///
/// Namespaces are created on first use and live as long as the registry.
/// Wrappers hold their namespace directly, so restoring or clearing the
/// registry is visible to them immediately.
pub struct MemoRegistry<V> {
    namespaces: DashMap<String, Arc<Namespace<V>>>,
}

impl<V> MemoRegistry<V> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            namespaces: DashMap::new(),
        }
    }

    /// Returns the namespace called `name`, creating it if needed.
    pub fn namespace(&self, name: &str) -> Arc<Namespace<V>> {
        if let Some(ns) = self.namespaces.get(name) {
            return Arc::clone(ns.value());
        }
        let ns = self
            .namespaces
            .entry(name.to_owned())
            .or_insert_with(|| {
                debug!(namespace = name, "Creating namespace");
                Arc::new(Namespace::new(name))
            });
        Arc::clone(ns.value())
    }

    /// Returns the namespace called `name` if it exists.
    pub fn get(&self, name: &str) -> Option<Arc<Namespace<V>>> {
        self.namespaces.get(name).map(|ns| Arc::clone(ns.value()))
    }

    /// Returns true if a namespace called `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Returns the namespace names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.iter().map(|ns| ns.key().clone()).collect();
        names.sort();
        names
    }

    /// Returns the number of namespaces.
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Returns true if no namespace exists.
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Returns the number of entries across all namespaces.
    pub fn entry_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.value().len()).sum()
    }

    /// Removes every entry of every namespace.
    pub fn clear(&self) {
        for ns in self.namespaces.iter() {
            ns.value().clear();
        }
    }

    /// Replaces the registry contents with `snapshot`.
    ///
    /// Namespaces missing from the snapshot are emptied, not dropped.
    pub fn restore(&self, mut snapshot: Snapshot<V>) {
        for ns in self.namespaces.iter() {
            if !snapshot.contains_key(ns.key()) {
                ns.value().clear();
            }
        }
        let namespaces = snapshot.len();
        for (name, entries) in snapshot.drain() {
            self.namespace(&name).replace(entries);
        }
        info!(namespaces, entries = self.entry_count(), "Registry restored");
    }

    /// Loads a snapshot from `store` and restores it.
    ///
    /// The registry is left untouched when loading fails.
    #[instrument(skip_all)]
    pub fn reload<P>(&self, store: &P) -> Result<usize>
    where
        P: CachePersistence<V> + ?Sized,
    {
        let snapshot = store.load()?;
        self.restore(snapshot);
        Ok(self.entry_count())
    }
}

impl<V: Clone> MemoRegistry<V> {
    /// Copies every namespace.
    pub fn snapshot(&self) -> Snapshot<V> {
        self.namespaces
            .iter()
            .map(|ns| (ns.key().clone(), ns.value().snapshot()))
            .collect()
    }

    /// Saves a snapshot to `store`.
    #[instrument(skip_all)]
    pub fn persist<P>(&self, store: &P) -> Result<()>
    where
        P: CachePersistence<V> + ?Sized,
    {
        let snapshot = self.snapshot();
        info!(namespaces = snapshot.len(), "Persisting registry");
        store.save(&snapshot)
    }
}

impl<V> Default for MemoRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memofn_core::error::MemoError;
    use memofn_core::types::{CacheEntry, CacheKey, Value};
    use parking_lot::Mutex;

    fn key(i: i64) -> CacheKey {
        CacheKey::derive(&Value::Int(i)).unwrap()
    }

    /// Keeps the last saved snapshot in memory.
    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Option<Snapshot<String>>>,
        fail_load: bool,
    }

    impl CachePersistence<String> for RecordingStore {
        fn load(&self) -> Result<Snapshot<String>> {
            if self.fail_load {
                return Err(MemoError::CorruptStore("bad magic".into()));
            }
            Ok(self.saved.lock().clone().unwrap_or_default())
        }

        fn save(&self, snapshot: &Snapshot<String>) -> Result<()> {
            *self.saved.lock() = Some(snapshot.clone());
            Ok(())
        }
    }

    #[test]
    fn test_namespace_created_once() {
        let registry: MemoRegistry<String> = MemoRegistry::new();
        let a = registry.namespace("a");
        let again = registry.namespace("a");
        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(registry.len(), 1);
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn test_names_sorted() {
        let registry: MemoRegistry<String> = MemoRegistry::new();
        registry.namespace("zeta");
        registry.namespace("alpha");
        assert_eq!(registry.names(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn test_persist_and_reload() {
        let store = RecordingStore::default();
        let registry = MemoRegistry::new();
        let now = Utc::now();
        registry.namespace("a").insert(key(1), CacheEntry::new("one".to_string(), now, None));
        registry.namespace("b").insert(key(2), CacheEntry::new("two".to_string(), now, None));
        registry.persist(&store).unwrap();

        let fresh: MemoRegistry<String> = MemoRegistry::new();
        assert_eq!(fresh.reload(&store).unwrap(), 2);
        assert_eq!(fresh.snapshot(), registry.snapshot());
    }

    #[test]
    fn test_restore_is_visible_to_existing_handles() {
        let registry = MemoRegistry::new();
        let handle = registry.namespace("a");
        handle.insert(key(1), CacheEntry::new("stale".to_string(), Utc::now(), None));

        let mut snapshot = Snapshot::new();
        snapshot.insert("b".to_string(), Default::default());
        registry.restore(snapshot);

        assert!(handle.is_empty());
        assert!(registry.contains("b"));
    }

    #[test]
    fn test_failed_reload_leaves_registry_untouched() {
        let store = RecordingStore {
            fail_load: true,
            ..Default::default()
        };
        let registry = MemoRegistry::new();
        registry.namespace("a").insert(key(1), CacheEntry::new("kept".to_string(), Utc::now(), None));

        let err = registry.reload(&store).unwrap_err();
        assert!(err.is_persistence_error());
        assert_eq!(registry.entry_count(), 1);
    }

    #[test]
    fn test_clear_keeps_namespaces() {
        let registry = MemoRegistry::new();
        registry.namespace("a").insert(key(1), CacheEntry::new("x".to_string(), Utc::now(), None));
        registry.clear();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.entry_count(), 0);
    }
}
