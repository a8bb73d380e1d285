//! The real capture surface, backed by a CDP page session.
//!
//! Generic element operations go through [`Page`]; the block-specific work
//! (discovery with stable-id tagging, the iframe probe) is injected script
//! built here, with selectors encoded as JS string literals so attribute
//! values containing quotes survive intact.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use blockshot_browser::{Browser, Page};
use blockshot_core::constants::POLL_INTERVAL_MS;
use blockshot_core::settings::CaptureSettings;

use crate::block::{BlockId, BlockKind};
use crate::error::{CaptureError, Result};
use crate::surface::{AuxSurface, CaptureSurface};

/// [`CaptureSurface`] over a live page.
#[derive(Debug)]
pub struct PageSurface {
    browser: Browser,
    page: Page,
    settings: CaptureSettings,
}

impl PageSurface {
    /// A surface over `page`, opening auxiliary tabs through `browser`.
    #[must_use]
    pub fn new(browser: Browser, page: Page, settings: CaptureSettings) -> Self {
        Self {
            browser,
            page,
            settings,
        }
    }

    fn unprocessed(&self) -> String {
        unprocessed_selector(&self.settings.block_selector, &self.settings.processed_attr)
    }

    fn by_id(&self, id: &BlockId) -> String {
        id_selector(&self.settings.block_id_attr, id.as_str())
    }

    fn vanished(id: &BlockId) -> CaptureError {
        CaptureError::BlockVanished { id: id.to_string() }
    }
}

#[async_trait]
impl CaptureSurface for PageSurface {
    async fn discover_next(&self) -> Result<Option<BlockId>> {
        let js = js_discover(&self.unprocessed(), &self.settings.block_id_attr);
        let value = self.page.evaluate(&js).await?;
        Ok(value.as_str().map(BlockId::new))
    }

    async fn scroll_into_view(&self, id: &BlockId) -> Result<()> {
        if self.page.scroll_into_view_centered(&self.by_id(id)).await? {
            Ok(())
        } else {
            Err(Self::vanished(id))
        }
    }

    async fn scroll_top(&self) -> Result<f64> {
        Ok(self.page.scroll_top().await?)
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn probe(&self, id: &BlockId) -> Result<BlockKind> {
        let value = self.page.evaluate(&js_probe(&self.by_id(id))).await?;
        if value.is_null() {
            return Err(Self::vanished(id));
        }
        let frame_url = value
            .get("frame")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        Ok(BlockKind::from_frame_url(frame_url))
    }

    async fn screenshot_block(&self, id: &BlockId) -> Result<Vec<u8>> {
        let region = self
            .page
            .element_region(&self.by_id(id))
            .await?
            .ok_or_else(|| Self::vanished(id))?;
        if region.is_empty() {
            return Err(Self::vanished(id));
        }
        Ok(self.page.screenshot_region(region).await?)
    }

    async fn mark_processed(&self, id: &BlockId) -> Result<bool> {
        let marked = self
            .page
            .set_attribute(&self.by_id(id), &self.settings.processed_attr, "true")
            .await?;
        Ok(marked)
    }

    async fn wait_for_unprocessed(&self, timeout: Duration) -> Result<bool> {
        let selector = self.unprocessed();
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.query_exists(&selector).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    async fn open_aux(&self, url: &str) -> Result<Box<dyn AuxSurface>> {
        let page = self.browser.new_page().await.map_err(CaptureError::from)?;
        let opened = async {
            page.set_viewport(self.settings.viewport_width, self.settings.viewport_height)
                .await?;
            page.navigate(url).await
        }
        .await;
        if let Err(err) = opened {
            // The tab never reached its caller; release it here.
            let _ = page.close().await;
            return Err(err.into());
        }
        debug!(url, target_id = page.target_id(), "auxiliary tab ready");
        Ok(Box::new(AuxPage { page }))
    }
}

/// [`AuxSurface`] over a live tab.
#[derive(Debug)]
struct AuxPage {
    page: Page,
}

#[async_trait]
impl AuxSurface for AuxPage {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn wait_hidden(&self, selector: &str, timeout: Duration) -> Result<()> {
        Ok(self.page.wait_for_hidden(selector, timeout).await?)
    }

    async fn screenshot_full(&self) -> Result<Vec<u8>> {
        Ok(self.page.screenshot_full().await?)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(self.page.close().await?)
    }
}

// ── JS builders (pure, testable) ─────────────────────────────────────────────

/// Encode a string as a JS string literal.
fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Selector for blocks whose processed marker is unset.
fn unprocessed_selector(block_selector: &str, processed_attr: &str) -> String {
    format!(r#"{block_selector}:not([{processed_attr}="true"])"#)
}

/// Selector addressing one block by its driver-assigned id.
fn id_selector(id_attr: &str, id: &str) -> String {
    format!(r#"[{id_attr}="{id}"]"#)
}

/// Find the first unprocessed block and return its stable id, tagging the
/// element on first sight from a page-global counter.
fn js_discover(unprocessed: &str, id_attr: &str) -> String {
    format!(
        r"(() => {{
  const block = document.querySelector({sel});
  if (!block) return null;
  let id = block.getAttribute({attr});
  if (id === null) {{
    window.__blockshotNextId = window.__blockshotNextId || 0;
    id = String(window.__blockshotNextId);
    window.__blockshotNextId += 1;
    block.setAttribute({attr}, id);
  }}
  return id;
}})()",
        sel = js_string(unprocessed),
        attr = js_string(id_attr),
    )
}

/// Probe the block for a nested iframe, returning its resolved src URL.
///
/// The raw attribute gates the check so a blank `src` falls back to plain
/// capture; the returned value is the `src` property, which absolutizes
/// relative URLs.
fn js_probe(id_selector: &str) -> String {
    format!(
        r"(() => {{
  const el = document.querySelector({sel});
  if (!el) return null;
  const frame = el.querySelector('iframe');
  const attr = frame ? frame.getAttribute('src') : null;
  if (attr === null || attr.trim() === '') return {{ frame: null }};
  return {{ frame: frame.src }};
}})()",
        sel = js_string(id_selector),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
