//! Browser error types.

use thiserror::Error;

/// Errors from Chrome discovery, launch, and CDP sessions.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// Chrome spawned but a usable DevTools endpoint never appeared.
    #[error("failed to launch Chrome: {0}")]
    Launch(String),
    /// The DevTools WebSocket failed to connect or dropped mid-call.
    #[error("CDP transport error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    /// The connection closed while a call was still waiting for its response.
    #[error("CDP connection closed while awaiting response to {0}")]
    ConnectionClosed(String),
    /// The browser answered a command with a protocol-level error.
    #[error("CDP error from {method}: {message}")]
    Protocol {
        /// Command that failed.
        method: String,
        /// Error message reported by the browser.
        message: String,
    },
    /// In-page JavaScript threw during evaluation.
    #[error("script evaluation failed: {0}")]
    Evaluate(String),
    /// A bounded wait expired.
    #[error("timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What the wait was for.
        what: String,
        /// The bound that expired, in milliseconds.
        ms: u64,
    },
    /// The DevTools HTTP endpoint failed during fallback discovery.
    #[error("DevTools HTTP endpoint error: {0}")]
    Http(#[from] reqwest::Error),
    /// Screenshot payload was not valid base64.
    #[error("failed to decode screenshot data: {0}")]
    Decode(#[from] base64::DecodeError),
    /// JSON (de)serialization of a CDP message failed.
    #[error("CDP message serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// Filesystem or process I/O during launch.
    #[error("browser I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for browser operations.
pub type Result<T> = std::result::Result<T, BrowserError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
