//! The traversal driver: sequence blocks under dynamic loading, forward-only.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use blockshot_core::settings::CaptureSettings;

use crate::block::BlockId;
use crate::error::Result;
use crate::strategy::BlockHandler;
use crate::surface::CaptureSurface;

/// Terminal outcome of a traversal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No unprocessed block was found, or none appeared within the
    /// discovery window. Normal completion.
    Exhausted,
    /// The document scrolled backwards between blocks. The driver aborts
    /// rather than risk reprocessing or skipping content after a reflow.
    Reverted,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Blocks captured and marked before the run ended.
    pub blocks_processed: u64,
}

/// Driver phase, advanced one transition per loop turn.
#[derive(Debug)]
enum State {
    /// Looking for the next unprocessed block.
    Scanning,
    /// One block selected and in flight.
    Processing { id: BlockId },
    /// Terminal.
    Done(RunOutcome),
}

/// Walks the document block by block, invoking a handler for each.
///
/// One driver drives one run. Progress must be forward-only: a post-scroll
/// sample lower than the position recorded after the previous block's
/// capture ends the run as [`RunOutcome::Reverted`]. Capture failures are
/// not retried; they propagate and abort the run.
#[derive(Debug)]
pub struct TraversalDriver {
    block_settle: Duration,
    discovery_timeout: Duration,
    visited: HashSet<BlockId>,
    last_scroll_top: Option<f64>,
    blocks_processed: u64,
}

impl TraversalDriver {
    /// A driver with explicit timings.
    #[must_use]
    pub fn new(block_settle: Duration, discovery_timeout: Duration) -> Self {
        Self {
            block_settle,
            discovery_timeout,
            visited: HashSet::new(),
            last_scroll_top: None,
            blocks_processed: 0,
        }
    }

    /// A driver with timings taken from run settings.
    #[must_use]
    pub fn from_settings(settings: &CaptureSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.block_settle_ms),
            Duration::from_millis(settings.discovery_timeout_ms),
        )
    }

    /// Run to a terminal state.
    pub async fn run(
        &mut self,
        surface: &dyn CaptureSurface,
        handler: &mut dyn BlockHandler,
    ) -> Result<RunReport> {
        let mut state = State::Scanning;
        loop {
            state = match state {
                State::Scanning => self.scan(surface).await?,
                State::Processing { id } => self.process(surface, handler, &id).await?,
                State::Done(outcome) => {
                    return Ok(RunReport {
                        outcome,
                        blocks_processed: self.blocks_processed,
                    });
                }
            };
        }
    }

    /// Select the next block, position it, and check forward progress.
    async fn scan(&mut self, surface: &dyn CaptureSurface) -> Result<State> {
        let Some(id) = surface.discover_next().await? else {
            info!(blocks = self.blocks_processed, "no unprocessed blocks remain");
            return Ok(State::Done(RunOutcome::Exhausted));
        };

        if !self.visited.insert(id.clone()) {
            // The DOM marker did not stick; the visited set keeps the block
            // from being captured twice. Re-mark and move on.
            warn!(%id, "already-captured block resurfaced unmarked, re-marking");
            let _ = surface.mark_processed(&id).await?;
            return Ok(State::Scanning);
        }

        surface.scroll_into_view(&id).await?;
        let top = surface.scroll_top().await?;
        if regressed(self.last_scroll_top, top) {
            warn!(
                top,
                previous = ?self.last_scroll_top,
                "scroll position moved backwards, aborting traversal"
            );
            return Ok(State::Done(RunOutcome::Reverted));
        }

        Ok(State::Processing { id })
    }

    /// Capture the selected block, mark it, record the scroll baseline,
    /// and wait for a successor.
    async fn process(
        &mut self,
        surface: &dyn CaptureSurface,
        handler: &mut dyn BlockHandler,
        id: &BlockId,
    ) -> Result<State> {
        surface.sleep(self.block_settle).await;

        // The marker is set only after the capture fully completes,
        // auxiliary tab teardown included, so a discovery query can never
        // race an in-flight capture.
        handler.handle(surface, id).await?;
        if !surface.mark_processed(id).await? {
            warn!(%id, "block vanished before its marker could be set");
        }
        // Re-sample after the capture: reflow during processing moves the
        // baseline the next scan's regression check compares against.
        self.last_scroll_top = Some(surface.scroll_top().await?);
        self.blocks_processed += 1;
        debug!(%id, processed = self.blocks_processed, "block captured");

        if surface.wait_for_unprocessed(self.discovery_timeout).await? {
            Ok(State::Scanning)
        } else {
            info!(
                blocks = self.blocks_processed,
                "no new blocks appeared within the discovery window"
            );
            Ok(State::Done(RunOutcome::Exhausted))
        }
    }
}

/// Whether the current scroll sample is a backwards step.
fn regressed(previous: Option<f64>, current: f64) -> bool {
    previous.is_some_and(|previous| current < previous)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
