//! Positional and keyword arguments of a single call.

use serde::{Deserialize, Serialize};

use super::Value;

/// Arguments of one invocation of a memoized callable.
///
/// Keyword arguments keep their insertion order; the cache key does not
/// depend on it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Args {
    /// Positional arguments, in call order.
    pub positional: Vec<Value>,
    /// Keyword arguments, in insertion order. Names are unique.
    pub keyword: Vec<(String, Value)>,
}

impl Args {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates arguments from positional values only.
    pub fn from_positional<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self {
            positional: items.into_iter().map(Into::into).collect(),
            keyword: Vec::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument. Re-setting a name replaces its value in place.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.keyword.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.keyword.push((name, value)),
        }
        self
    }

    /// Returns the positional argument at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Returns the keyword argument called `name`.
    pub fn get_kwarg(&self, name: &str) -> Option<&Value> {
        self.keyword.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Total number of arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Returns true if there are no arguments at all.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// The raw value a cache key is derived from:
    /// `(positional[ignore_first_n_args..], keyword)`.
    ///
    /// Skipping past the end yields an empty positional tuple.
    pub fn key_value(&self, ignore_first_n_args: usize) -> Value {
        let skip = ignore_first_n_args.min(self.positional.len());
        Value::Tuple(vec![
            Value::Tuple(self.positional[skip..].to_vec()),
            Value::Map(
                self.keyword
                    .iter()
                    .map(|(k, v)| (Value::Str(k.clone()), v.clone()))
                    .collect(),
            ),
        ])
    }
}

/// Builds [`Args`]: positional values first, then `; name = value` pairs.
///
/// ```rust
/// use memofn_core::args;
///
/// let call = args!["b", "c"; d = "d", e = "e"];
/// assert_eq!(call.positional.len(), 2);
/// assert_eq!(call.keyword.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    ($($pos:expr),* $(,)? $(; $($key:ident = $val:expr),* $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut call = $crate::Args::new();
        $(call = call.arg($pos);)*
        $($(call = call.kwarg(stringify!($key), $val);)*)?
        call
    }};
}
