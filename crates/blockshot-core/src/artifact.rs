//! Artifact naming: the per-run counter and diagram-path derivation.
//!
//! Every run hands out base names from a zero-based counter (`0.png`,
//! `1.png`, ...) with no reuse and no gaps. An embedded frame's companion
//! image reuses the block's base name with a suffix spliced in before the
//! extension (`3.png` → `3-diagram.png`).

use std::path::{Path, PathBuf};

use crate::constants;

/// Hands out artifact paths for one run, in counter order.
#[derive(Debug)]
pub struct ArtifactNamer {
    dir: PathBuf,
    next: u64,
}

impl ArtifactNamer {
    /// A namer rooted at `dir`, starting from `0`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: 0,
        }
    }

    /// Path for the next artifact. Each call consumes one counter slot.
    pub fn next_path(&mut self) -> PathBuf {
        let path = self
            .dir
            .join(format!("{}.{}", self.next, constants::ARTIFACT_EXT));
        self.next += 1;
        path
    }

    /// How many base names have been handed out so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next
    }
}

/// Derive the diagram companion path from a block artifact path.
///
/// The suffix lands immediately before the final segment's extension and
/// only there; directory components are never touched. Not idempotent:
/// deriving twice stacks the suffix, so call it once per block.
#[must_use]
pub fn diagram_path(base: &Path) -> PathBuf {
    let name = match (base.file_stem(), base.extension()) {
        (Some(stem), Some(ext)) => format!(
            "{}{}.{}",
            stem.to_string_lossy(),
            constants::DIAGRAM_SUFFIX,
            ext.to_string_lossy()
        ),
        (Some(stem), None) => format!("{}{}", stem.to_string_lossy(), constants::DIAGRAM_SUFFIX),
        (None, _) => return base.to_path_buf(),
    };
    base.with_file_name(name)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
