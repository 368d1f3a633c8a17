//! # memofn Core
//!
//! Core types, canonical keys, errors, and traits for memofn.
//!
//! This crate provides the building blocks used by the other memofn crates:
//!
//! - **Types**: argument values, call arguments, cache keys and entries
//! - **Canonicalization**: turning arbitrary arguments into stable keys
//! - **Errors**: one error enum for key, config and persistence failures
//! - **Traits**: clock, staleness policy and persistence seams
//!
//! ## Example
//!
//! ```rust
//! use memofn_core::{args, CacheKey};
//!
//! let a = CacheKey::for_call(&args!["b", "c"; d = "d", e = "e"], 0).unwrap();
//! let b = CacheKey::for_call(&args!["b", "c"; e = "e", d = "d"], 0).unwrap();
//! assert_eq!(a, b);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod canonical;
pub mod clock;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use canonical::make_hashable;
pub use clock::{ManualClock, SystemClock};
pub use constants::*;
pub use error::{MemoError, Result};
pub use traits::*;
pub use types::*;
