//! Package-level constants: the selector contract and timing defaults.
//!
//! The selectors here are a contract with the target page and must match
//! exactly; the timing values are defaults that [`crate::settings`] can
//! override per run.

/// Current version of blockshot (sourced from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name.
pub const NAME: &str = "blockshot";

// ── Selector contract ────────────────────────────────────────────────────────

/// Selector matching every content block on the page.
pub const BLOCK_SELECTOR: &str = r#"div[data-lookup="contents-block"]"#;

/// Attribute written on a block once its artifacts are on disk.
/// Discovery queries exclude elements carrying it.
pub const PROCESSED_ATTR: &str = "data-touched-puppet";

/// Attribute holding the driver-assigned stable id of a block.
pub const BLOCK_ID_ATTR: &str = "data-blockshot-id";

/// Selector for the container that gates page readiness before the walk.
pub const CONTAINER_SELECTOR: &str = r#"div[data-lookup="design-container"]"#;

/// Selector for the optional cookie-consent accept button.
pub const CONSENT_SELECTOR: &str = "#onetrust-accept-btn-handler";

/// Selector for the loading indicator inside an embedded frame's document.
pub const FRAME_LOADING_SELECTOR: &str = "#load-loading";

// ── Artifact naming ──────────────────────────────────────────────────────────

/// Extension of every artifact file.
pub const ARTIFACT_EXT: &str = "png";

/// Suffix inserted before the extension for an embedded frame's artifact.
pub const DIAGRAM_SUFFIX: &str = "-diagram";

// ── Timing defaults (milliseconds) ───────────────────────────────────────────

/// How long to wait for the cookie-consent button before giving up on it.
pub const CONSENT_WAIT_MS: u64 = 3_000;

/// How long to wait for the readiness container to appear.
pub const CONTAINER_READY_TIMEOUT_MS: u64 = 30_000;

/// Settle delay after the readiness container appears.
pub const CONTAINER_SETTLE_MS: u64 = 3_000;

/// Settle delay after scrolling a block into view, before capturing it.
pub const BLOCK_SETTLE_MS: u64 = 1_000;

/// Settle delay after navigating the auxiliary surface, before the
/// loading-indicator wait.
pub const FRAME_PRE_WAIT_MS: u64 = 1_000;

/// How long to wait for the embedded frame's loading indicator to disappear.
pub const FRAME_READY_TIMEOUT_MS: u64 = 30_000;

/// Settle delay after the loading indicator disappears, before the
/// full-surface screenshot. Absorbs post-load animation and layout shift.
pub const FRAME_POST_WAIT_MS: u64 = 2_500;

/// How long to wait for the next unprocessed block before treating the page
/// as exhausted.
pub const DISCOVERY_TIMEOUT_MS: u64 = 5_000;

/// Interval between checks in selector polling waits.
pub const POLL_INTERVAL_MS: u64 = 100;

// ── Viewport defaults ────────────────────────────────────────────────────────

/// Default viewport width in CSS pixels.
pub const VIEWPORT_WIDTH: u32 = 1_440;

/// Default viewport height in CSS pixels.
pub const VIEWPORT_HEIGHT: u32 = 900;
