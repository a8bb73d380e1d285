//! Run settings with environment variable overrides.
//!
//! There is no settings file: a run is configured from compiled defaults
//! (see [`crate::constants`]), then `BLOCKSHOT_*` environment variables,
//! then CLI flags applied by the binary. Invalid env values are logged at
//! `warn` and ignored.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Everything tunable about a capture run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureSettings {
    /// Run Chrome headless.
    pub headless: bool,
    /// Viewport width in CSS pixels.
    pub viewport_width: u32,
    /// Viewport height in CSS pixels.
    pub viewport_height: u32,
    /// Selector matching every content block.
    pub block_selector: String,
    /// Attribute marking a block as processed.
    pub processed_attr: String,
    /// Attribute holding the driver-assigned block id.
    pub block_id_attr: String,
    /// Selector gating page readiness before the walk.
    pub container_selector: String,
    /// Selector for the optional cookie-consent button.
    pub consent_selector: String,
    /// Selector for the embedded frame's loading indicator.
    pub frame_loading_selector: String,
    /// Wait for the consent button, in milliseconds.
    pub consent_wait_ms: u64,
    /// Wait for the readiness container, in milliseconds.
    pub container_ready_timeout_ms: u64,
    /// Settle after the readiness container appears, in milliseconds.
    pub container_settle_ms: u64,
    /// Settle after scrolling a block into view, in milliseconds.
    pub block_settle_ms: u64,
    /// Settle after navigating the auxiliary surface, in milliseconds.
    pub frame_pre_wait_ms: u64,
    /// Wait for the loading indicator to disappear, in milliseconds.
    pub frame_ready_timeout_ms: u64,
    /// Settle after the loading indicator disappears, in milliseconds.
    pub frame_post_wait_ms: u64,
    /// Wait for the next unprocessed block, in milliseconds.
    pub discovery_timeout_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: constants::VIEWPORT_WIDTH,
            viewport_height: constants::VIEWPORT_HEIGHT,
            block_selector: constants::BLOCK_SELECTOR.to_string(),
            processed_attr: constants::PROCESSED_ATTR.to_string(),
            block_id_attr: constants::BLOCK_ID_ATTR.to_string(),
            container_selector: constants::CONTAINER_SELECTOR.to_string(),
            consent_selector: constants::CONSENT_SELECTOR.to_string(),
            frame_loading_selector: constants::FRAME_LOADING_SELECTOR.to_string(),
            consent_wait_ms: constants::CONSENT_WAIT_MS,
            container_ready_timeout_ms: constants::CONTAINER_READY_TIMEOUT_MS,
            container_settle_ms: constants::CONTAINER_SETTLE_MS,
            block_settle_ms: constants::BLOCK_SETTLE_MS,
            frame_pre_wait_ms: constants::FRAME_PRE_WAIT_MS,
            frame_ready_timeout_ms: constants::FRAME_READY_TIMEOUT_MS,
            frame_post_wait_ms: constants::FRAME_POST_WAIT_MS,
            discovery_timeout_ms: constants::DISCOVERY_TIMEOUT_MS,
        }
    }
}

impl CaptureSettings {
    /// Defaults with `BLOCKSHOT_*` environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        apply_env_overrides(&mut settings);
        settings
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are logged at `warn` and ignored
pub fn apply_env_overrides(settings: &mut CaptureSettings) {
    if let Some(v) = read_env_bool("BLOCKSHOT_HEADLESS") {
        settings.headless = v;
    }
    if let Some(v) = read_env_u32("BLOCKSHOT_VIEWPORT_WIDTH", 320, 10_000) {
        settings.viewport_width = v;
    }
    if let Some(v) = read_env_u32("BLOCKSHOT_VIEWPORT_HEIGHT", 240, 10_000) {
        settings.viewport_height = v;
    }
    if let Some(v) = read_env_u64("BLOCKSHOT_CONSENT_WAIT_MS", 0, 60_000) {
        settings.consent_wait_ms = v;
    }
    if let Some(v) = read_env_u64("BLOCKSHOT_CONTAINER_READY_TIMEOUT_MS", 1_000, 300_000) {
        settings.container_ready_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("BLOCKSHOT_CONTAINER_SETTLE_MS", 0, 60_000) {
        settings.container_settle_ms = v;
    }
    if let Some(v) = read_env_u64("BLOCKSHOT_BLOCK_SETTLE_MS", 0, 60_000) {
        settings.block_settle_ms = v;
    }
    if let Some(v) = read_env_u64("BLOCKSHOT_FRAME_PRE_WAIT_MS", 0, 60_000) {
        settings.frame_pre_wait_ms = v;
    }
    if let Some(v) = read_env_u64("BLOCKSHOT_FRAME_READY_TIMEOUT_MS", 1_000, 300_000) {
        settings.frame_ready_timeout_ms = v;
    }
    if let Some(v) = read_env_u64("BLOCKSHOT_FRAME_POST_WAIT_MS", 0, 60_000) {
        settings.frame_post_wait_ms = v;
    }
    if let Some(v) = read_env_u64("BLOCKSHOT_DISCOVERY_TIMEOUT_MS", 500, 300_000) {
        settings.discovery_timeout_ms = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
