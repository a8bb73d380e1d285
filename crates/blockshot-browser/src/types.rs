//! Shared browser-layer types.

use serde::{Deserialize, Serialize};

/// A rectangular region of the document, in CSS pixels.
///
/// Coordinates are document-absolute (element rect plus scroll offsets), so a
/// region stays valid regardless of the current viewport position. Serializes
/// to the field names `Page.captureScreenshot` expects for its clip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    /// Left edge in document coordinates.
    pub x: f64,
    /// Top edge in document coordinates.
    pub y: f64,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl Region {
    /// True when the region has no capturable area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
