//! Browser and page sessions over CDP.
//!
//! [`Browser`] wraps the browser-level connection; [`Page`] is one attached
//! tab (a flattened target session). Everything the capture layers need from
//! a tab funnels through here: navigation, script evaluation, polling waits,
//! and screenshots.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};

use blockshot_core::constants::POLL_INTERVAL_MS;

use crate::connection::CdpConnection;
use crate::error::{BrowserError, Result};
use crate::types::Region;

/// Bound on a navigation reaching `document.readyState === "complete"`.
const NAV_TIMEOUT_MS: u64 = 30_000;

/// A connected browser instance.
#[derive(Clone, Debug)]
pub struct Browser {
    conn: Arc<CdpConnection>,
}

impl Browser {
    /// Connect to a browser-level DevTools WebSocket URL.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let conn = CdpConnection::connect(ws_url).await?;
        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Open a new blank tab and attach to it.
    pub async fn new_page(&self) -> Result<Page> {
        let created = self
            .conn
            .call("Target.createTarget", serde_json::json!({"url": "about:blank"}))
            .await?;
        let target_id = str_field(&created, "targetId", "Target.createTarget")?.to_string();

        let attached = self
            .conn
            .call(
                "Target.attachToTarget",
                serde_json::json!({"targetId": target_id, "flatten": true}),
            )
            .await?;
        let session_id = str_field(&attached, "sessionId", "Target.attachToTarget")?.to_string();

        debug!(%target_id, %session_id, "page attached");
        Ok(Page {
            conn: Arc::clone(&self.conn),
            session_id,
            target_id,
        })
    }

    /// Ask the browser to shut down gracefully.
    pub async fn close(&self) -> Result<()> {
        let _ = self.conn.call("Browser.close", serde_json::json!({})).await?;
        Ok(())
    }
}

/// One attached tab.
#[derive(Clone, Debug)]
pub struct Page {
    conn: Arc<CdpConnection>,
    session_id: String,
    target_id: String,
}

impl Page {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.conn.call_in_session(&self.session_id, method, params).await
    }

    /// CDP target id of this tab.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Navigate and wait for the document to finish loading.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        info!(url, "navigating");
        let result = self
            .call("Page.navigate", serde_json::json!({"url": url}))
            .await?;
        if let Some(error_text) = result.get("errorText").and_then(Value::as_str) {
            if !error_text.is_empty() {
                return Err(BrowserError::Protocol {
                    method: "Page.navigate".to_string(),
                    message: error_text.to_string(),
                });
            }
        }
        self.wait_for_load().await
    }

    async fn wait_for_load(&self) -> Result<()> {
        let deadline = Instant::now() + Duration::from_millis(NAV_TIMEOUT_MS);
        loop {
            let state = self.evaluate("document.readyState").await?;
            if state.as_str() == Some("complete") {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: "page load".to_string(),
                    ms: NAV_TIMEOUT_MS,
                });
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    /// Evaluate an expression in the page, returning its value by JSON.
    ///
    /// Promises are awaited; a thrown exception becomes
    /// [`BrowserError::Evaluate`].
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .call(
                "Runtime.evaluate",
                serde_json::json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;
        if let Some(details) = result.get("exceptionDetails") {
            let text = details
                .get("exception")
                .and_then(|e| e.get("description"))
                .and_then(Value::as_str)
                .or_else(|| details.get("text").and_then(Value::as_str))
                .unwrap_or("unknown exception");
            return Err(BrowserError::Evaluate(text.to_string()));
        }
        Ok(result
            .get("result")
            .and_then(|r| r.get("value"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Whether any element matches the selector right now.
    pub async fn query_exists(&self, selector: &str) -> Result<bool> {
        let value = self.evaluate(&js_query_exists(selector)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Poll until the selector matches; error on deadline.
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.query_exists(selector).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: format!("selector {selector}"),
                    ms: timeout.as_millis().try_into().unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    /// Poll until no visible element matches the selector; error on deadline.
    ///
    /// "Hidden" covers absent, `display: none`, `visibility: hidden`, and
    /// zero-sized elements.
    pub async fn wait_for_hidden(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            let hidden = self.evaluate(&js_is_hidden(selector)).await?;
            if hidden.as_bool().unwrap_or(false) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout {
                    what: format!("selector {selector} to hide"),
                    ms: timeout.as_millis().try_into().unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    /// Click the first element matching the selector.
    ///
    /// Returns `Ok(false)` when nothing matches.
    pub async fn click(&self, selector: &str) -> Result<bool> {
        let value = self.evaluate(&js_click(selector)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Smoothly scroll the first matching element to the viewport center.
    ///
    /// Returns `Ok(false)` when nothing matches. The scroll is animated on
    /// purpose: pages that load content lazily gate the next batch on scroll
    /// events and intersection observers, and an instant jump can fail to
    /// fire them.
    pub async fn scroll_into_view_centered(&self, selector: &str) -> Result<bool> {
        let value = self.evaluate(&js_scroll_into_view(selector)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Current vertical scroll offset of the page.
    pub async fn scroll_top(&self) -> Result<f64> {
        let value = self.evaluate(JS_SCROLL_TOP).await?;
        Ok(value.as_f64().unwrap_or(0.0))
    }

    /// Bounding box of the first matching element, in document coordinates.
    ///
    /// Returns `Ok(None)` when nothing matches.
    pub async fn element_region(&self, selector: &str) -> Result<Option<Region>> {
        let value = self.evaluate(&js_element_region(selector)).await?;
        if value.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Set an attribute on the first matching element.
    ///
    /// Returns `Ok(false)` when nothing matches.
    pub async fn set_attribute(&self, selector: &str, name: &str, value: &str) -> Result<bool> {
        let result = self.evaluate(&js_set_attribute(selector, name, value)).await?;
        Ok(result.as_bool().unwrap_or(false))
    }

    /// Fix the viewport to the given CSS-pixel size.
    pub async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        let _ = self
            .call(
                "Emulation.setDeviceMetricsOverride",
                serde_json::json!({
                    "width": width,
                    "height": height,
                    "deviceScaleFactor": 1,
                    "mobile": false,
                }),
            )
            .await?;
        Ok(())
    }

    /// PNG screenshot of a document-coordinate region.
    pub async fn screenshot_region(&self, region: Region) -> Result<Vec<u8>> {
        let result = self
            .call(
                "Page.captureScreenshot",
                serde_json::json!({
                    "format": "png",
                    "clip": clip_params(region)?,
                    "captureBeyondViewport": true,
                }),
            )
            .await?;
        decode_screenshot(&result)
    }

    /// PNG screenshot of the current viewport.
    pub async fn screenshot_full(&self) -> Result<Vec<u8>> {
        let result = self
            .call(
                "Page.captureScreenshot",
                serde_json::json!({"format": "png"}),
            )
            .await?;
        decode_screenshot(&result)
    }

    /// Close this tab.
    pub async fn close(&self) -> Result<()> {
        let result = self
            .conn
            .call(
                "Target.closeTarget",
                serde_json::json!({"targetId": self.target_id}),
            )
            .await?;
        if result.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(BrowserError::Protocol {
                method: "Target.closeTarget".to_string(),
                message: format!("browser refused to close target {}", self.target_id),
            });
        }
        debug!(target_id = %self.target_id, "page closed");
        Ok(())
    }
}

// ── JS builders (pure, testable) ─────────────────────────────────────────────

/// Encode a string as a JS string literal.
fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn js_query_exists(selector: &str) -> String {
    format!("document.querySelector({}) !== null", js_string(selector))
}

fn js_click(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); if (!el) return false; el.click(); return true; }})()",
        js_string(selector)
    )
}

fn js_is_hidden(selector: &str) -> String {
    format!(
        r"(() => {{
  const el = document.querySelector({});
  if (!el) return true;
  const style = window.getComputedStyle(el);
  if (style.display === 'none' || style.visibility === 'hidden') return true;
  const rect = el.getBoundingClientRect();
  return rect.width === 0 && rect.height === 0;
}})()",
        js_string(selector)
    )
}

fn js_scroll_into_view(selector: &str) -> String {
    format!(
        r"(() => {{
  const el = document.querySelector({sel});
  if (!el) return false;
  el.scrollIntoView({{ behavior: 'smooth', block: 'center' }});
  return true;
}})()",
        sel = js_string(selector),
    )
}

fn js_element_region(selector: &str) -> String {
    format!(
        r"(() => {{
  const el = document.querySelector({sel});
  if (!el) return null;
  const rect = el.getBoundingClientRect();
  return {{
    x: rect.x + window.scrollX,
    y: rect.y + window.scrollY,
    width: rect.width,
    height: rect.height,
  }};
}})()",
        sel = js_string(selector),
    )
}

fn js_set_attribute(selector: &str, name: &str, value: &str) -> String {
    format!(
        r"(() => {{
  const el = document.querySelector({sel});
  if (!el) return false;
  el.setAttribute({name}, {value});
  return true;
}})()",
        sel = js_string(selector),
        name = js_string(name),
        value = js_string(value),
    )
}

const JS_SCROLL_TOP: &str = "window.scrollY || window.pageYOffset || document.documentElement.scrollTop || document.body.scrollTop || 0";

/// Screenshot clip payload for a region (scale pinned to 1).
fn clip_params(region: Region) -> Result<Value> {
    let mut clip = serde_json::to_value(region)?;
    clip["scale"] = serde_json::json!(1);
    Ok(clip)
}

fn decode_screenshot(result: &Value) -> Result<Vec<u8>> {
    use base64::Engine as _;
    let data = result
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| BrowserError::Protocol {
            method: "Page.captureScreenshot".to_string(),
            message: "response missing data field".to_string(),
        })?;
    Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
}

fn str_field<'a>(value: &'a Value, key: &str, method: &str) -> Result<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| BrowserError::Protocol {
            method: method.to_string(),
            message: format!("response missing {key} field"),
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
