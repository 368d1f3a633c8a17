//! Domain types for memofn.
//!
//! - [`Value`]: dynamically shaped argument values
//! - [`Args`]: positional and keyword arguments of one call
//! - [`CacheKey`]: canonical, hashable form of a call's arguments
//! - [`CacheEntry`]: a cached result with its timestamps and stamp

mod value;
mod args;
mod key;
mod entry;

pub use value::*;
pub use args::*;
pub use key::*;
pub use entry::*;
