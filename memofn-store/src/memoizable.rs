//! File-backed memoization of stateful computations.
//!
//! Implement [`Memoizable::run`] and wrap the value in a [`FileMemo`]. The
//! cache is read from disk once when the wrapper is built and written back
//! after every call that ran the computation, so results survive restarts.

use std::any::type_name;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use memofn_cache::{Lookup, MaxAge, MemoRegistry, Namespace};
use memofn_core::clock::SystemClock;
use memofn_core::constants::{DEFAULT_CACHE_FILE, DEFAULT_EXPIRE_IN_DAYS};
use memofn_core::error::{MemoError, Result};
use memofn_core::traits::{Clock, StalenessPolicy};
use memofn_core::types::{Args, CacheEntry, CacheKey};

use crate::file::FileStore;

/// A computation whose results are worth keeping on disk.
pub trait Memoizable {
    /// Result of a run. Stored in the cache file.
    type Output: Clone + Serialize + DeserializeOwned;
    /// Error of a run. Cache failures are converted into it.
    type Error: From<MemoError>;

    /// Performs the computation.
    ///
    /// The default fails with [`MemoError::NotImplemented`]; every real
    /// implementation overrides it.
    fn run(&mut self, _args: &Args) -> std::result::Result<Self::Output, Self::Error> {
        Err(MemoError::NotImplemented(format!("{}::run must be overridden", type_name::<Self>())).into())
    }

    /// Namespace the results are stored under inside the cache file.
    fn namespace(&self) -> String {
        type_name::<Self>().to_owned()
    }
}

/// Settings of a [`FileMemo`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMemoConfig {
    /// Backing file.
    pub cache_file: PathBuf,
    /// Entries older than this many days are recomputed.
    pub expire_in_days: f64,
}

impl Default for FileMemoConfig {
    fn default() -> Self {
        Self {
            cache_file: PathBuf::from(DEFAULT_CACHE_FILE),
            expire_in_days: DEFAULT_EXPIRE_IN_DAYS,
        }
    }
}

impl FileMemoConfig {
    /// Sets the backing file.
    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = path.into();
        self
    }

    /// Sets the expiration window.
    pub fn with_expire_in_days(mut self, days: f64) -> Self {
        self.expire_in_days = days;
        self
    }
}

/// A [`Memoizable`] bound to a cache file.
pub struct FileMemo<M: Memoizable> {
    inner: M,
    store: FileStore,
    registry: MemoRegistry<M::Output>,
    namespace: Arc<Namespace<M::Output>>,
    policy: Box<dyn StalenessPolicy>,
    clock: Arc<dyn Clock>,
}

impl<M: Memoizable> FileMemo<M> {
    /// Wraps `inner` with the default settings: `.cache`, 7 days.
    pub fn new(inner: M) -> Result<Self> {
        Self::with_config(inner, FileMemoConfig::default())
    }

    /// Wraps `inner` and loads the cache file, if it exists.
    pub fn with_config(inner: M, config: FileMemoConfig) -> Result<Self> {
        let policy = MaxAge::days(config.expire_in_days)?;
        let store = FileStore::new(&config.cache_file);
        let registry = MemoRegistry::new();
        let entries = registry.reload(&store)?;
        let namespace = registry.namespace(&inner.namespace());

        info!(
            path = ?store.path(),
            namespace = namespace.name(),
            entries,
            "File memo ready"
        );

        Ok(Self {
            inner,
            store,
            registry,
            namespace,
            policy: Box::new(policy),
            clock: Arc::new(SystemClock),
        })
    }

    /// Replaces the age-based policy, e.g. with a stamp policy over an input
    /// file's digest.
    pub fn with_policy<P>(mut self, policy: P) -> Self
    where
        P: StalenessPolicy + 'static,
    {
        self.policy = Box::new(policy);
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the cached result for `args`, running the computation when
    /// there is none or it is stale.
    ///
    /// After a run the whole cache is written to the backing file before
    /// returning. A failed run writes nothing.
    pub fn call(&mut self, args: &Args) -> std::result::Result<M::Output, M::Error> {
        let key = CacheKey::for_call(args, 0)?;
        let lookup = Lookup {
            policy: &*self.policy,
            bypass: None,
            clock: &*self.clock,
            compute_once: false,
        };
        let inner = &mut self.inner;
        let (value, outcome) = self.namespace.resolve(key, args, &lookup, || inner.run(args))?;

        if outcome.computed() {
            debug!(namespace = self.namespace.name(), ?outcome, "Saving after run");
            self.save()?;
        }
        Ok(value)
    }

    /// Writes the cache to the backing file.
    pub fn save(&self) -> Result<()> {
        self.registry.persist(&self.store)
    }

    /// Writes the cache to `path`, leaving the backing file alone.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        self.registry.persist(&FileStore::new(path))
    }

    /// Discards in-memory entries and reads the backing file again.
    pub fn reload(&self) -> Result<usize> {
        self.registry.reload(&self.store)
    }

    /// Returns the cached entry for `args` without touching it.
    pub fn peek(&self, args: &Args) -> Result<Option<CacheEntry<M::Output>>> {
        let key = CacheKey::for_call(args, 0)?;
        Ok(self.namespace.entry(&key))
    }

    /// Number of entries under this computation's namespace.
    pub fn len(&self) -> usize {
        self.namespace.len()
    }

    /// Returns true if nothing is cached under this computation's namespace.
    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Returns the backing file path.
    pub fn cache_file(&self) -> &Path {
        self.store.path()
    }

    /// Returns the namespace name.
    pub fn namespace_name(&self) -> &str {
        self.namespace.name()
    }

    /// Returns the wrapped computation.
    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Returns the wrapped computation mutably.
    pub fn inner_mut(&mut self) -> &mut M {
        &mut self.inner
    }

    /// Unwraps the computation. Unsaved state is lost.
    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: Memoizable> std::fmt::Debug for FileMemo<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMemo")
            .field("cache_file", &self.store.path())
            .field("namespace", &self.namespace.name())
            .field("entries", &self.namespace.len())
            .finish_non_exhaustive()
    }
}
