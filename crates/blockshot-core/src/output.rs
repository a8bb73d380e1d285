//! Run preparation: URL-safe directory names and output directory setup.

use std::path::Path;

use tracing::debug;

use crate::errors::Result;

/// Encode a URL as a directory name.
///
/// Every run of characters outside `[A-Za-z0-9_.]` collapses to a single
/// underscore, so `https://example.com/a?x=1` becomes
/// `https_example.com_a_x_1`.
#[must_use]
pub fn safe_dir_name(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    let mut in_run = false;
    for c in url.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Create `dir` if missing, then delete every regular file directly inside.
///
/// Subdirectories are left alone. Leaves the directory existing and
/// file-empty, which is the state the capture run assumes.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!(path = %dir.display(), "clearing output directory");
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                std::fs::remove_file(entry.path())?;
            }
        }
    } else {
        debug!(path = %dir.display(), "creating output directory");
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
