//! File digests as staleness stamps.
//!
//! A cached result derived from a file stays valid while the file's bytes
//! are unchanged. [`content_digest_policy`] stamps each entry with the
//! SHA3-256 digest of the file named by one of the call's arguments.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha3::{Digest, Sha3_256};

use memofn_cache::StampPolicy;
use memofn_core::constants::DIGEST_CHUNK_SIZE;
use memofn_core::error::{MemoError, Result};
use memofn_core::types::{Args, Value};

/// Hex-encoded SHA3-256 digest of the file at `path`, read in chunks.
pub fn file_digest(path: impl AsRef<Path>) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha3_256::new();
    let mut buf = [0u8; DIGEST_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        Digest::update(&mut hasher, &buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Stamp policy keyed on the contents of the file named by positional
/// argument `arg_index`.
///
/// The stamp is computed on every lookup, so a missing or unreadable file
/// fails the call with [`MemoError::Stamp`].
pub fn content_digest_policy(arg_index: usize) -> StampPolicy {
    StampPolicy::new(move |args: &Args| path_digest(args, arg_index))
}

fn path_digest(args: &Args, arg_index: usize) -> Result<Value> {
    let path = args
        .get(arg_index)
        .and_then(Value::as_str)
        .ok_or_else(|| MemoError::Stamp(format!("argument {} is not a path", arg_index)))?;

    file_digest(path)
        .map(Value::from)
        .map_err(|e| MemoError::Stamp(format!("{}: {}", path, e)))
}
