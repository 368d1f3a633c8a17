//! Memo store for memofn.
//!
//! Namespaced in-memory caches with pluggable staleness policies, and the
//! wrapper that puts a callable in front of them.
//!
//! ## Example
//!
//! ```rust
//! use memofn_cache::{memoize, MemoConfig, MemoRegistry};
//! use memofn_core::{args, Args, MemoError};
//!
//! let registry = MemoRegistry::new();
//! let square = memoize(
//!     |args: &Args| Ok::<_, MemoError>(args.get(0).and_then(|v| v.as_i64()).unwrap_or(0).pow(2)),
//!     MemoConfig::default().with_namespace("square").with_expire_in_days(1.0),
//!     &registry,
//! )
//! .unwrap();
//!
//! assert_eq!(square.call(&args![12]).unwrap(), 144);
//! assert_eq!(square.stats().misses, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod memo;
mod namespace;
mod policy;
mod registry;

pub use memo::{derive_namespace, memoize, BypassFn, MemoConfig, Memoized};
pub use namespace::{Lookup, Namespace, NamespaceStats};
pub use policy::{policy_for, MaxAge, NeverExpire, StampComparator, StampFn, StampPolicy};
pub use registry::MemoRegistry;
