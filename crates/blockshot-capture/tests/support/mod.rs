//! Scripted fakes for driving the pipeline without a browser.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use blockshot_browser::BrowserError;
use blockshot_capture::{ArtifactSink, AuxSurface, BlockId, BlockKind, CaptureSurface, Result};

#[derive(Debug)]
struct ScriptedBlock {
    id: String,
    kind: BlockKind,
    marked: bool,
    gone: bool,
    vanish_before_mark: bool,
    mark_calls: u64,
    marks_required: u64,
    fail_screenshot: bool,
}

impl ScriptedBlock {
    fn new(id: &str, kind: BlockKind) -> Self {
        Self {
            id: id.to_string(),
            kind,
            marked: false,
            gone: false,
            vanish_before_mark: false,
            mark_calls: 0,
            marks_required: 1,
            fail_screenshot: false,
        }
    }
}

#[derive(Debug, Default)]
struct AuxCounters {
    closes: AtomicU64,
    shots: AtomicU64,
}

#[derive(Debug)]
struct Inner {
    blocks: Vec<ScriptedBlock>,
    pending: VecDeque<ScriptedBlock>,
    samples: VecDeque<f64>,
    fallback_top: f64,
    scroll_reads: u64,
    wait_calls: u64,
    opened_urls: Vec<String>,
}

/// A capture surface that follows a script instead of a DOM.
///
/// Blocks are discovered in insertion order until marked; scroll samples
/// are consumed one per read, falling back to a monotone ramp when the
/// script runs out.
#[derive(Debug)]
pub struct ScriptedSurface {
    inner: Mutex<Inner>,
    aux: Arc<AuxCounters>,
    fail_frame_wait: bool,
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSurface {
    /// An empty script: no blocks, monotone scroll.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                blocks: Vec::new(),
                pending: VecDeque::new(),
                samples: VecDeque::new(),
                fallback_top: 0.0,
                scroll_reads: 0,
                wait_calls: 0,
                opened_urls: Vec::new(),
            }),
            aux: Arc::new(AuxCounters::default()),
            fail_frame_wait: false,
        }
    }

    /// Add a block discoverable from the start.
    #[must_use]
    pub fn with_block(self, id: &str, kind: BlockKind) -> Self {
        self.inner.lock().blocks.push(ScriptedBlock::new(id, kind));
        self
    }

    /// Add a block that only appears after a discovery wait.
    #[must_use]
    pub fn with_pending_block(self, id: &str, kind: BlockKind) -> Self {
        self.inner
            .lock()
            .pending
            .push_back(ScriptedBlock::new(id, kind));
        self
    }

    /// Add a block that is captured normally but vanishes before its
    /// marker can be set.
    #[must_use]
    pub fn with_vanishing_block(self, id: &str, kind: BlockKind) -> Self {
        let mut block = ScriptedBlock::new(id, kind);
        block.vanish_before_mark = true;
        self.inner.lock().blocks.push(block);
        self
    }

    /// Script the scroll samples returned by successive reads.
    #[must_use]
    pub fn with_scroll_samples(self, samples: &[f64]) -> Self {
        self.inner.lock().samples = samples.iter().copied().collect();
        self
    }

    /// Require `n` mark attempts before the block's marker sticks.
    #[must_use]
    pub fn with_marks_required(self, id: &str, n: u64) -> Self {
        {
            let mut inner = self.inner.lock();
            if let Some(block) = inner.blocks.iter_mut().find(|b| b.id == id) {
                block.marks_required = n;
            }
        }
        self
    }

    /// Make the block's screenshot fail.
    #[must_use]
    pub fn with_failing_screenshot(self, id: &str) -> Self {
        {
            let mut inner = self.inner.lock();
            if let Some(block) = inner.blocks.iter_mut().find(|b| b.id == id) {
                block.fail_screenshot = true;
            }
        }
        self
    }

    /// Make every auxiliary tab's indicator wait time out.
    #[must_use]
    pub fn with_failing_frame_wait(mut self) -> Self {
        self.fail_frame_wait = true;
        self
    }

    /// How many times the discovery wait ran.
    pub fn wait_calls(&self) -> u64 {
        self.inner.lock().wait_calls
    }

    /// How many times the scroll position was read.
    pub fn scroll_reads(&self) -> u64 {
        self.inner.lock().scroll_reads
    }

    /// How many times the block's marker was written.
    pub fn mark_calls(&self, id: &str) -> u64 {
        self.inner
            .lock()
            .blocks
            .iter()
            .find(|b| b.id == id)
            .map_or(0, |b| b.mark_calls)
    }

    /// URLs opened in auxiliary tabs, in order.
    pub fn opened_urls(&self) -> Vec<String> {
        self.inner.lock().opened_urls.clone()
    }

    /// How many auxiliary tabs were closed.
    pub fn aux_closes(&self) -> u64 {
        self.aux.closes.load(Ordering::SeqCst)
    }

    /// How many auxiliary screenshots were taken.
    pub fn aux_shots(&self) -> u64 {
        self.aux.shots.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureSurface for ScriptedSurface {
    async fn discover_next(&self) -> Result<Option<BlockId>> {
        let inner = self.inner.lock();
        Ok(inner
            .blocks
            .iter()
            .find(|b| !b.marked && !b.gone)
            .map(|b| BlockId::new(b.id.clone())))
    }

    async fn scroll_into_view(&self, _id: &BlockId) -> Result<()> {
        Ok(())
    }

    async fn scroll_top(&self) -> Result<f64> {
        let mut inner = self.inner.lock();
        inner.scroll_reads += 1;
        let top = match inner.samples.pop_front() {
            Some(sample) => sample,
            None => inner.fallback_top + 100.0,
        };
        inner.fallback_top = inner.fallback_top.max(top);
        Ok(top)
    }

    async fn sleep(&self, _duration: Duration) {}

    async fn probe(&self, id: &BlockId) -> Result<BlockKind> {
        let inner = self.inner.lock();
        Ok(inner
            .blocks
            .iter()
            .find(|b| b.id == id.as_str())
            .map_or(BlockKind::Plain, |b| b.kind.clone()))
    }

    async fn screenshot_block(&self, id: &BlockId) -> Result<Vec<u8>> {
        let inner = self.inner.lock();
        let block = inner.blocks.iter().find(|b| b.id == id.as_str());
        if block.is_some_and(|b| b.fail_screenshot) {
            return Err(BrowserError::Protocol {
                method: "Page.captureScreenshot".to_string(),
                message: "scripted failure".to_string(),
            }
            .into());
        }
        Ok(format!("block-{id}").into_bytes())
    }

    async fn mark_processed(&self, id: &BlockId) -> Result<bool> {
        let mut inner = self.inner.lock();
        let Some(block) = inner.blocks.iter_mut().find(|b| b.id == id.as_str()) else {
            return Ok(false);
        };
        if block.vanish_before_mark {
            block.gone = true;
            return Ok(false);
        }
        block.mark_calls += 1;
        if block.mark_calls >= block.marks_required {
            block.marked = true;
        }
        Ok(true)
    }

    async fn wait_for_unprocessed(&self, _timeout: Duration) -> Result<bool> {
        let mut inner = self.inner.lock();
        inner.wait_calls += 1;
        if inner.blocks.iter().any(|b| !b.marked && !b.gone) {
            return Ok(true);
        }
        if let Some(block) = inner.pending.pop_front() {
            inner.blocks.push(block);
            return Ok(true);
        }
        Ok(false)
    }

    async fn open_aux(&self, url: &str) -> Result<Box<dyn AuxSurface>> {
        self.inner.lock().opened_urls.push(url.to_string());
        Ok(Box::new(ScriptedAux {
            counters: Arc::clone(&self.aux),
            fail_wait: self.fail_frame_wait,
        }))
    }
}

struct ScriptedAux {
    counters: Arc<AuxCounters>,
    fail_wait: bool,
}

#[async_trait]
impl AuxSurface for ScriptedAux {
    async fn sleep(&self, _duration: Duration) {}

    async fn wait_hidden(&self, selector: &str, timeout: Duration) -> Result<()> {
        if self.fail_wait {
            return Err(BrowserError::Timeout {
                what: format!("selector {selector} to hide"),
                ms: timeout.as_millis().try_into().unwrap_or(u64::MAX),
            }
            .into());
        }
        Ok(())
    }

    async fn screenshot_full(&self) -> Result<Vec<u8>> {
        let _ = self.counters.shots.fetch_add(1, Ordering::SeqCst);
        Ok(b"frame".to_vec())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.counters.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An artifact sink that records write order in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    writes: Mutex<Vec<PathBuf>>,
}

impl RecordingSink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths written so far, in order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl ArtifactSink for RecordingSink {
    async fn write(&self, path: &Path, _bytes: &[u8]) -> Result<()> {
        self.writes.lock().push(path.to_path_buf());
        Ok(())
    }
}
