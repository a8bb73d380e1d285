//! Filesystem artifact sink.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CaptureError, Result};
use crate::surface::ArtifactSink;

/// Writes artifacts straight to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactSink;

impl FsArtifactSink {
    /// A sink writing wherever the paths point.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArtifactSink for FsArtifactSink {
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| CaptureError::Artifact {
                        path: path.to_path_buf(),
                        source,
                    })?;
            }
        }
        tokio::fs::write(path, bytes)
            .await
            .map_err(|source| CaptureError::Artifact {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), len = bytes.len(), "artifact written");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
