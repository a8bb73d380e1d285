//! Capture pipeline errors.

use std::path::PathBuf;

use blockshot_browser::BrowserError;

/// Errors surfaced by the traversal and capture pipeline.
///
/// Single-block failures are not retried; they abort the whole run. The
/// only recoveries are the expected-absent cases handled inline (no frame
/// in a block, no consent button, no further unprocessed blocks).
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// A browser operation failed.
    #[error("browser: {0}")]
    Browser(#[from] BrowserError),

    /// An artifact could not be persisted.
    #[error("writing artifact {path}: {source}")]
    Artifact {
        /// Destination that failed.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The block being captured disappeared or lost its layout box.
    #[error("block {id} vanished mid-capture")]
    BlockVanished {
        /// Driver-assigned id of the block.
        id: String,
    },
}

/// Convenience alias for capture results.
pub type Result<T> = std::result::Result<T, CaptureError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
