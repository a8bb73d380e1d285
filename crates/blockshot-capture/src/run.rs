//! Session-level orchestration of one capture run.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use blockshot_browser::{Browser, BrowserError, Page};
use blockshot_core::settings::CaptureSettings;

use crate::driver::{RunReport, TraversalDriver};
use crate::error::Result;
use crate::live::PageSurface;
use crate::settle::SettleProtocol;
use crate::sink::FsArtifactSink;
use crate::strategy::CaptureStrategy;
use crate::surface::ArtifactSink;

/// Capture every content block of `url` into `out_dir`.
///
/// Opens a fresh tab, prepares the page (consent, readiness gate), then
/// walks it with the traversal driver until a terminal state. The output
/// directory is expected to exist and be empty; preparing it is the
/// caller's job.
pub async fn execute(
    browser: &Browser,
    url: &str,
    settings: &CaptureSettings,
    out_dir: &Path,
) -> Result<RunReport> {
    let page = browser.new_page().await?;
    page.set_viewport(settings.viewport_width, settings.viewport_height)
        .await?;
    page.navigate(url).await?;

    dismiss_consent(&page, settings).await?;
    await_ready(&page, settings).await?;

    let surface = PageSurface::new(browser.clone(), page.clone(), settings.clone());
    let sink: Arc<dyn ArtifactSink> = Arc::new(FsArtifactSink::new());
    let mut strategy =
        CaptureStrategy::new(out_dir, sink, SettleProtocol::from_settings(settings));
    let mut driver = TraversalDriver::from_settings(settings);

    let result = driver.run(&surface, &mut strategy).await;
    if let Ok(report) = &result {
        info!(
            outcome = ?report.outcome,
            blocks = report.blocks_processed,
            artifacts = strategy.artifacts_written(),
            "capture run finished"
        );
    }

    if let Err(err) = page.close().await {
        debug!(error = %err, "main page close failed");
    }
    result
}

/// Dismiss the cookie-consent prompt if it shows up within its window.
///
/// An absent prompt is the common case, not an error.
async fn dismiss_consent(page: &Page, settings: &CaptureSettings) -> Result<()> {
    let wait = Duration::from_millis(settings.consent_wait_ms);
    match page.wait_for_selector(&settings.consent_selector, wait).await {
        Ok(()) => {
            if page.click(&settings.consent_selector).await? {
                debug!("consent prompt dismissed");
            }
            Ok(())
        }
        Err(BrowserError::Timeout { .. }) => {
            debug!("no consent prompt within its window");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Wait for the page's readiness container, then let layout settle.
async fn await_ready(page: &Page, settings: &CaptureSettings) -> Result<()> {
    let timeout = Duration::from_millis(settings.container_ready_timeout_ms);
    page.wait_for_selector(&settings.container_selector, timeout)
        .await?;
    tokio::time::sleep(Duration::from_millis(settings.container_settle_ms)).await;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
