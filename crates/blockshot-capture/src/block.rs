//! Block identity and classification.

use std::fmt;

/// Stable identity of one content block, assigned at first discovery.
///
/// The id is written onto the element as a DOM attribute so selector-based
/// discovery can keep working, but the driver's own visited set is the
/// authority on which blocks have been handled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId(String);

impl BlockId {
    /// Wrap a raw id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id value as written to the DOM.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a single probe of a block found.
///
/// Classified exactly once per block; the capture strategy dispatches on
/// the tag instead of re-querying the DOM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// No usable embedded frame; one region screenshot covers the block.
    Plain,
    /// Carries an embedded frame whose content is captured from its own tab.
    Embedded {
        /// Source URL of the embedded frame.
        frame_url: String,
    },
}

impl BlockKind {
    /// Classify a block from its probed frame URL.
    ///
    /// A missing or blank URL cannot be navigated to independently, so the
    /// block falls back to plain capture.
    #[must_use]
    pub fn from_frame_url(frame_url: Option<String>) -> Self {
        match frame_url {
            Some(url) if !url.trim().is_empty() => Self::Embedded { frame_url: url },
            _ => Self::Plain,
        }
    }

    /// Whether this block needs an auxiliary capture pass.
    #[must_use]
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::Embedded { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
