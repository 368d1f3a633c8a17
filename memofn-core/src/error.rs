//! Error types for memofn.
//!
//! One error enum covers key derivation, configuration and persistence.
//! Failures of the memoized function itself never pass through here: they
//! travel in the caller's own error type, which only has to absorb
//! [`MemoError`] via `From`.

use thiserror::Error;

/// Result type alias using `MemoError`.
pub type Result<T> = std::result::Result<T, MemoError>;

/// Main error type for all memofn operations.
#[derive(Debug, Error)]
pub enum MemoError {
    // ═══════════════════════════════════════════════════════════════════════════
    // KEY DERIVATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// An argument subtree is neither keyable, mapping-shaped, nor iterable.
    #[error("Can't make hashable: {0}")]
    Unhashable(String),

    /// A stamp function of a staleness policy failed.
    #[error("Stamp computation failed: {0}")]
    Stamp(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Invalid wrapper or store configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// `Memoizable::run` was invoked without being overridden.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // PERSISTENCE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The persisted cache is truncated or not a memofn store.
    #[error("Corrupt cache store: {0}")]
    CorruptStore(String),

    /// Store format version mismatch.
    #[error("Store version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: u8,
        /// Found version
        actual: u8,
    },
}

impl MemoError {
    /// Returns true if this error came from loading or saving a snapshot.
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            MemoError::Io(_)
                | MemoError::Serialization(_)
                | MemoError::CorruptStore(_)
                | MemoError::VersionMismatch { .. }
        )
    }

    /// Returns true if this error was raised while deriving a cache key or stamp.
    pub fn is_key_error(&self) -> bool {
        matches!(self, MemoError::Unhashable(_) | MemoError::Stamp(_))
    }
}
