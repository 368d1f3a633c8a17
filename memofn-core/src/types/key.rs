//! Cache keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Args, Value};
use crate::canonical::make_hashable;
use crate::error::Result;

/// Canonical, structurally comparable key of a call.
///
/// Only constructed through canonicalization, so the wrapped value is always
/// keyable (scalars and tuples of keyable values).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(Value);

impl CacheKey {
    /// Derives the key of an arbitrary value.
    pub fn derive(item: &Value) -> Result<Self> {
        make_hashable(item).map(CacheKey)
    }

    /// Derives the key of a call, ignoring its first `ignore_first_n_args`
    /// positional arguments.
    pub fn for_call(args: &Args, ignore_first_n_args: usize) -> Result<Self> {
        Self::derive(&args.key_value(ignore_first_n_args))
    }

    /// Returns the canonical value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the key, returning the canonical value.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
