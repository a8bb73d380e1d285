//! The traits the pipeline drives the browser through.
//!
//! The traversal driver and capture strategy never touch CDP directly; they
//! speak to a [`CaptureSurface`], so the whole control flow can be exercised
//! against scripted fakes. [`super::live`] provides the real implementation
//! over a browser page.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::block::{BlockId, BlockKind};
use crate::error::Result;

/// Page-level view of the document being traversed.
#[async_trait]
pub trait CaptureSurface: Send + Sync {
    /// Find the first content block in document order whose processed
    /// marker is unset, tagging it with a stable id on first sight.
    async fn discover_next(&self) -> Result<Option<BlockId>>;

    /// Bring the block to the viewport center with animated scrolling.
    async fn scroll_into_view(&self, id: &BlockId) -> Result<()>;

    /// Current vertical scroll offset of the document.
    async fn scroll_top(&self) -> Result<f64>;

    /// Pause traversal for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Probe the block once for an embedded frame.
    async fn probe(&self, id: &BlockId) -> Result<BlockKind>;

    /// Screenshot the block's bounding region.
    async fn screenshot_block(&self, id: &BlockId) -> Result<Vec<u8>>;

    /// Set the block's processed marker in the DOM.
    ///
    /// Returns `false` when the block is no longer present; a vanished
    /// block cannot be re-selected, so this is not an error.
    async fn mark_processed(&self, id: &BlockId) -> Result<bool>;

    /// Wait until at least one unprocessed block exists.
    ///
    /// Returns `false` on timeout, which the driver treats as exhaustion.
    async fn wait_for_unprocessed(&self, timeout: Duration) -> Result<bool>;

    /// Open an auxiliary tab and navigate it to the given URL.
    async fn open_aux(&self, url: &str) -> Result<Box<dyn AuxSurface>>;
}

/// A short-lived tab for capturing embedded frame content.
///
/// Owned exclusively by one block's capture and closed before that capture
/// returns, on success or failure.
#[async_trait]
pub trait AuxSurface: Send + Sync {
    /// Pause for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Wait until no visible element matches the selector.
    async fn wait_hidden(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// Full-viewport screenshot of the tab.
    async fn screenshot_full(&self) -> Result<Vec<u8>>;

    /// Close the tab. Consuming the surface makes a double close
    /// unrepresentable.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Destination for finished artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persist one artifact at the given path.
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}
