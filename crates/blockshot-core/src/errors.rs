//! Core error types.

use thiserror::Error;

/// Errors from run preparation (output directory setup).
#[derive(Debug, Error)]
pub enum CoreError {
    /// A filesystem operation on the output directory failed.
    #[error("output directory error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
