//! The settle protocol for embedded frame content.
//!
//! Frame pages render asynchronously: the loading indicator disappearing is
//! necessary but not sufficient for visual stability, since layout and
//! animation can still be in flight when it first hides. The protocol is
//! therefore a fixed pre-wait, a bounded wait for the indicator to go away,
//! then a longer fixed post-wait. Callers treat the sequence as one named
//! contract so an event-driven readiness check could replace it wholesale.

use std::time::Duration;

use blockshot_core::settings::CaptureSettings;

use crate::error::Result;
use crate::surface::AuxSurface;

/// The wait sequence run against an auxiliary tab before screenshotting it.
#[derive(Debug, Clone)]
pub struct SettleProtocol {
    /// Fixed wait after navigation, before consulting the indicator.
    pub pre_wait: Duration,
    /// Selector of the frame's loading indicator.
    pub indicator: String,
    /// Bound on the indicator disappearing.
    pub indicator_timeout: Duration,
    /// Fixed wait after the indicator disappears.
    pub post_wait: Duration,
}

impl SettleProtocol {
    /// Build the protocol from run settings.
    #[must_use]
    pub fn from_settings(settings: &CaptureSettings) -> Self {
        Self {
            pre_wait: Duration::from_millis(settings.frame_pre_wait_ms),
            indicator: settings.frame_loading_selector.clone(),
            indicator_timeout: Duration::from_millis(settings.frame_ready_timeout_ms),
            post_wait: Duration::from_millis(settings.frame_post_wait_ms),
        }
    }

    /// Run the full sequence. A wait failure propagates; the caller owns
    /// releasing the tab.
    pub async fn run(&self, aux: &dyn AuxSurface) -> Result<()> {
        aux.sleep(self.pre_wait).await;
        aux.wait_hidden(&self.indicator, self.indicator_timeout).await?;
        aux.sleep(self.post_wait).await;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
