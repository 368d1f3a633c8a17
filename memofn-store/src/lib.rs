//! # memofn Store
//!
//! Persistence for memofn registries and the file-backed memoization mode.
//!
//! This crate provides:
//!
//! - **FileStore**: snapshots in a single binary file, saved atomically
//! - **MemoryStore**: snapshots kept as encoded bytes, for tests
//! - **FileMemo**: a [`Memoizable`] computation whose results persist
//! - **Digests**: file content stamps for staleness checks
//!
//! ## Example
//!
//! ```rust,no_run
//! use memofn_core::{args, Args, MemoError};
//! use memofn_store::{FileMemo, Memoizable};
//!
//! struct Shout;
//!
//! impl Memoizable for Shout {
//!     type Output = String;
//!     type Error = MemoError;
//!
//!     fn run(&mut self, args: &Args) -> Result<String, MemoError> {
//!         Ok(args.get(0).and_then(|v| v.as_str()).unwrap_or_default().to_uppercase())
//!     }
//! }
//!
//! let mut shout = FileMemo::new(Shout)?;
//! assert_eq!(shout.call(&args!["hi"])?, "HI");
//! # Ok::<(), MemoError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod codec;
mod digest;
mod file;
mod memoizable;
mod memory;

pub use digest::{content_digest_policy, file_digest};
pub use file::FileStore;
pub use memoizable::{FileMemo, FileMemoConfig, Memoizable};
pub use memory::MemoryStore;
