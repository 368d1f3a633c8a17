//! Constants shared by the memofn crates.

// ═══════════════════════════════════════════════════════════════════════════════
// EXPIRATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Expiration window used by the file-backed mode when none is configured.
pub const DEFAULT_EXPIRE_IN_DAYS: f64 = 7.0;

/// Seconds in one day, used to turn fractional day counts into durations.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

// ═══════════════════════════════════════════════════════════════════════════════
// PERSISTENCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Backing file of the file-backed mode when none is configured.
pub const DEFAULT_CACHE_FILE: &str = ".cache";

/// File format magic bytes.
pub const STORE_MAGIC: &[u8; 4] = b"MEMO";

/// Current file format version.
pub const STORE_VERSION: u8 = 1;

/// Header length: magic (4) + version (1) + namespace count (8).
pub const STORE_HEADER_SIZE: usize = 13;

// ═══════════════════════════════════════════════════════════════════════════════
// DIGESTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Read size used when digesting files for stamps.
pub const DIGEST_CHUNK_SIZE: usize = 8192;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size_matches_layout() {
        assert_eq!(STORE_HEADER_SIZE, STORE_MAGIC.len() + 1 + 8);
    }
}
