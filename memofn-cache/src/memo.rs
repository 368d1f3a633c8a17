//! Wrapping callables with a memo store.
//!
//! [`memoize`] takes a callable over [`Args`], a [`MemoConfig`] and a
//! [`MemoRegistry`], and returns a [`Memoized`] wrapper with the same call
//! shape. Each call derives a [`CacheKey`] from the arguments, looks it up in
//! the wrapper's namespace and either returns the cached value or runs the
//! callable and stores the result.
//!
//! Values are owned by the store; every hit returns a clone. Wrap large
//! results in `Arc` to share them cheaply.

use std::any::type_name;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use memofn_core::clock::SystemClock;
use memofn_core::error::{MemoError, Result};
use memofn_core::traits::{Clock, StalenessPolicy};
use memofn_core::types::{Args, CacheEntry, CacheKey, Outcome};

use crate::namespace::{Lookup, Namespace, NamespaceStats};
use crate::policy::{policy_for, validate_days};
use crate::registry::MemoRegistry;

/// Predicate over a call's full arguments; `true` forces a recompute.
pub type BypassFn = dyn Fn(&Args) -> bool + Send + Sync;

/// Wrapper configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// Explicit namespace. `None` or empty derives it from the callable's
    /// type name.
    pub namespace: Option<String>,
    /// Entries older than this many days are recomputed.
    pub expire_in_days: Option<f64>,
    /// Leading positional arguments left out of the key, e.g. a receiver.
    pub ignore_first_n_args: usize,
    /// Hold a per-key lock across lookup and compute so that concurrent
    /// callers of one key run the callable once.
    pub compute_once: bool,
}

impl MemoConfig {
    /// Sets the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the expiration window.
    pub fn with_expire_in_days(mut self, days: f64) -> Self {
        self.expire_in_days = Some(days);
        self
    }

    /// Leaves the first `n` positional arguments out of the key.
    pub fn with_ignore_first_n_args(mut self, n: usize) -> Self {
        self.ignore_first_n_args = n;
        self
    }

    /// Enables or disables the per-key lock.
    pub fn with_compute_once(mut self, enabled: bool) -> Self {
        self.compute_once = enabled;
        self
    }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(days) = self.expire_in_days {
            validate_days(days)?;
        }
        Ok(())
    }

    /// The namespace name for a callable of type `F`.
    pub fn namespace_for<F>(&self) -> String {
        match self.namespace.as_deref() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => derive_namespace::<F>(),
        }
    }
}

/// Namespace derived from a callable's type: its module path and name.
///
/// Closures created by the same function share a type, and therefore a
/// namespace, unless an explicit one is configured.
pub fn derive_namespace<F>() -> String {
    type_name::<F>().to_owned()
}

/// A memoized callable.
pub struct Memoized<F, V, E> {
    func: F,
    config: MemoConfig,
    namespace: Arc<Namespace<V>>,
    policy: Arc<dyn StalenessPolicy>,
    bypass: Option<Arc<BypassFn>>,
    clock: Arc<dyn Clock>,
    _error: PhantomData<fn() -> E>,
}

/// Wraps `func` with a memo store living in `registry`.
///
/// The namespace is resolved (and created) now. Fails only on invalid
/// configuration.
pub fn memoize<F, V, E>(func: F, config: MemoConfig, registry: &MemoRegistry<V>) -> Result<Memoized<F, V, E>>
where
    F: Fn(&Args) -> std::result::Result<V, E>,
{
    config.validate()?;
    let name = config.namespace_for::<F>();
    debug!(namespace = %name, expire_in_days = ?config.expire_in_days, "Wrapping callable");

    Ok(Memoized {
        func,
        policy: policy_for(config.expire_in_days)?,
        namespace: registry.namespace(&name),
        config,
        bypass: None,
        clock: Arc::new(SystemClock),
        _error: PhantomData,
    })
}

impl<F, V, E> Memoized<F, V, E>
where
    F: Fn(&Args) -> std::result::Result<V, E>,
    V: Clone,
    E: From<MemoError>,
{
    /// Calls through the cache.
    ///
    /// Key derivation happens before dispatch: an unkeyable argument fails
    /// with [`MemoError::Unhashable`] and the callable never runs. Errors of
    /// the callable are returned unchanged and nothing is cached for them.
    pub fn call(&self, args: &Args) -> std::result::Result<V, E> {
        self.call_with_outcome(args).map(|(value, _)| value)
    }

    /// Like [`call`](Self::call), also reporting how the call was served.
    pub fn call_with_outcome(&self, args: &Args) -> std::result::Result<(V, Outcome), E> {
        let key = self.key_for(args)?;
        let lookup = Lookup {
            policy: &*self.policy,
            bypass: self.bypass.as_deref(),
            clock: &*self.clock,
            compute_once: self.config.compute_once,
        };
        self.namespace.resolve(key, args, &lookup, || (self.func)(args))
    }

    /// Borrows the wrapper as a plain closure.
    pub fn as_fn(&self) -> impl Fn(&Args) -> std::result::Result<V, E> + '_ {
        move |args: &Args| self.call(args)
    }
}

impl<F, V, E> Memoized<F, V, E> {
    /// Forces a recompute whenever `bypass` returns true for the full
    /// arguments. Checked before, and regardless of, the staleness policy.
    pub fn with_bypass<P>(mut self, bypass: P) -> Self
    where
        P: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        self.bypass = Some(Arc::new(bypass));
        self
    }

    /// Replaces the staleness policy derived from `expire_in_days`.
    pub fn with_policy<P>(mut self, policy: P) -> Self
    where
        P: StalenessPolicy + 'static,
    {
        self.policy = Arc::new(policy);
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The cache key a call with `args` maps to.
    pub fn key_for(&self, args: &Args) -> Result<CacheKey> {
        CacheKey::for_call(args, self.config.ignore_first_n_args)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MemoConfig {
        &self.config
    }

    /// Returns the namespace name.
    pub fn namespace_name(&self) -> &str {
        self.namespace.name()
    }

    /// Returns the namespace this wrapper stores into.
    pub fn namespace(&self) -> &Arc<Namespace<V>> {
        &self.namespace
    }

    /// Drops the entry for `args`. Returns true if there was one.
    pub fn invalidate(&self, args: &Args) -> Result<bool> {
        let key = self.key_for(args)?;
        Ok(self.namespace.remove(&key).is_some())
    }

    /// Drops every entry of the namespace, including entries written by
    /// other wrappers sharing it.
    pub fn clear(&self) {
        self.namespace.clear();
    }

    /// Removes entries the active policy reports as stale for any call.
    ///
    /// Age-based policies evict entries past their window; stamp policies
    /// need a call's arguments to decide and evict nothing.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        self.namespace.evict_where(|meta| self.policy.is_evictable(meta, now))
    }

    /// Returns namespace counters.
    pub fn stats(&self) -> NamespaceStats {
        self.namespace.stats()
    }

    /// Returns the wrapped callable.
    pub fn into_inner(self) -> F {
        self.func
    }
}

impl<F, V: Clone, E> Memoized<F, V, E> {
    /// Returns a copy of the entry for `args` without counting a hit.
    pub fn peek(&self, args: &Args) -> Result<Option<CacheEntry<V>>> {
        let key = self.key_for(args)?;
        Ok(self.namespace.entry(&key))
    }

    /// Stores `value` for `args` as if it had just been computed.
    pub fn prime(&self, args: &Args, value: V) -> Result<()> {
        let key = self.key_for(args)?;
        let now = self.clock.now();
        let current = self.policy.current_stamp(args, now)?;
        let stamp = self.policy.stored_stamp(args, current)?;
        self.namespace.insert(key, CacheEntry::new(value, now, stamp));
        Ok(())
    }
}

impl<F, V, E> std::fmt::Debug for Memoized<F, V, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memoized")
            .field("namespace", &self.namespace.name())
            .field("config", &self.config)
            .field("bypass", &self.bypass.is_some())
            .finish_non_exhaustive()
    }
}
