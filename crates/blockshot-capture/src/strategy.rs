//! Per-block capture: one artifact for plain blocks, two for embedded ones.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use blockshot_core::artifact::{ArtifactNamer, diagram_path};

use crate::block::{BlockId, BlockKind};
use crate::error::Result;
use crate::settle::SettleProtocol;
use crate::surface::{ArtifactSink, AuxSurface, CaptureSurface};

/// Handles one discovered block, producing its artifacts.
///
/// The traversal driver invokes this once per selected block and awaits
/// completion, auxiliary tab teardown included, before marking the block.
#[async_trait]
pub trait BlockHandler: Send {
    /// Capture the block's artifacts.
    async fn handle(&mut self, surface: &dyn CaptureSurface, id: &BlockId) -> Result<()>;
}

/// The default capture strategy.
///
/// Each block consumes exactly one counter slot; embedded blocks add a
/// companion image at the derived diagram path.
pub struct CaptureStrategy {
    namer: ArtifactNamer,
    sink: Arc<dyn ArtifactSink>,
    settle: SettleProtocol,
    artifacts_written: u64,
}

impl CaptureStrategy {
    /// A strategy writing artifacts under `out_dir` through `sink`.
    #[must_use]
    pub fn new(
        out_dir: impl Into<PathBuf>,
        sink: Arc<dyn ArtifactSink>,
        settle: SettleProtocol,
    ) -> Self {
        Self {
            namer: ArtifactNamer::new(out_dir),
            sink,
            settle,
            artifacts_written: 0,
        }
    }

    /// Total artifacts persisted so far, diagram images included.
    #[must_use]
    pub fn artifacts_written(&self) -> u64 {
        self.artifacts_written
    }

    async fn capture_embedded(
        &mut self,
        surface: &dyn CaptureSurface,
        frame_url: &str,
        diagram: &Path,
    ) -> Result<()> {
        debug!(frame_url, path = %diagram.display(), "capturing embedded frame");
        let aux = surface.open_aux(frame_url).await?;
        // The tab is released on every exit path; a settle or screenshot
        // failure still propagates afterwards.
        let result = self.settle_and_shoot(&*aux, diagram).await;
        let close_result = aux.close().await;
        result?;
        close_result?;
        Ok(())
    }

    async fn settle_and_shoot(&mut self, aux: &dyn AuxSurface, diagram: &Path) -> Result<()> {
        self.settle.run(aux).await?;
        let bytes = aux.screenshot_full().await?;
        self.write_artifact(diagram, &bytes).await
    }

    async fn write_artifact(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.sink.write(path, bytes).await?;
        self.artifacts_written += 1;
        Ok(())
    }
}

#[async_trait]
impl BlockHandler for CaptureStrategy {
    async fn handle(&mut self, surface: &dyn CaptureSurface, id: &BlockId) -> Result<()> {
        let kind = surface.probe(id).await?;
        let base_path = self.namer.next_path();
        debug!(%id, path = %base_path.display(), embedded = kind.is_embedded(), "capturing block");

        // Block-level shot first in both branches: it preserves the
        // placeholder chrome even when the embed itself fails later.
        let bytes = surface.screenshot_block(id).await?;
        self.write_artifact(&base_path, &bytes).await?;

        if let BlockKind::Embedded { frame_url } = kind {
            let diagram = diagram_path(&base_path);
            self.capture_embedded(surface, &frame_url, &diagram).await?;
        }
        Ok(())
    }
}

impl fmt::Debug for CaptureStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureStrategy")
            .field("namer", &self.namer)
            .field("settle", &self.settle)
            .field("artifacts_written", &self.artifacts_written)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
