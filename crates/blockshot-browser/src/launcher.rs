//! Chrome process launch and DevTools endpoint discovery.
//!
//! Chrome is spawned with `--remote-debugging-port=0` (the OS picks a free
//! port) and a throwaway profile directory. The WebSocket endpoint is read
//! from the `DevTools listening on ws://...` stderr line; if that line never
//! shows up (some packagings fork and detach), the `DevToolsActivePort` file
//! in the profile plus the `/json/version` HTTP endpoint are the fallback.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, trace};

use blockshot_core::constants;

use crate::error::{BrowserError, Result};

/// How long Chrome gets to expose a DevTools endpoint.
const LAUNCH_TIMEOUT_MS: u64 = 30_000;

/// Builder for a Chrome process.
#[derive(Debug)]
pub struct ChromeLauncher {
    binary: PathBuf,
    headless: bool,
    window_width: u32,
    window_height: u32,
}

impl ChromeLauncher {
    /// A launcher for the given binary: headless, default window size.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            headless: true,
            window_width: constants::VIEWPORT_WIDTH,
            window_height: constants::VIEWPORT_HEIGHT,
        }
    }

    /// Toggle headless mode (headful starts with a maximized window).
    #[must_use]
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the window size used in headless mode.
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Spawn Chrome and wait for its DevTools WebSocket endpoint.
    pub async fn launch(self) -> Result<ChromeProcess> {
        let profile = tempfile::Builder::new()
            .prefix("blockshot-profile-")
            .tempdir()?;
        let args = build_args(
            profile.path(),
            self.headless,
            self.window_width,
            self.window_height,
        );

        info!(binary = %self.binary.display(), headless = self.headless, "launching Chrome");
        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BrowserError::Launch("stderr was not captured".into()))?;
        let mut lines = BufReader::new(stderr).lines();

        let scan = async {
            while let Ok(Some(line)) = lines.next_line().await {
                trace!(line = %line, "chrome stderr");
                if let Some(url) = parse_devtools_line(&line) {
                    return Some(url.to_string());
                }
            }
            None
        };
        let ws_url = match tokio::time::timeout(Duration::from_millis(LAUNCH_TIMEOUT_MS), scan)
            .await
        {
            Ok(Some(url)) => url,
            Ok(None) | Err(_) => endpoint_from_port_file(profile.path()).await?,
        };

        // Keep draining stderr so Chrome never blocks on a full pipe.
        let _ = tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                trace!(line = %line, "chrome stderr");
            }
        });

        info!(ws_url = %ws_url, "Chrome DevTools endpoint ready");
        Ok(ChromeProcess {
            child,
            ws_url,
            _profile: profile,
        })
    }
}

/// A running Chrome owned by this process.
///
/// The child is killed when this is dropped; the throwaway profile directory
/// is removed with it.
#[derive(Debug)]
pub struct ChromeProcess {
    child: tokio::process::Child,
    ws_url: String,
    _profile: tempfile::TempDir,
}

impl ChromeProcess {
    /// The browser-level DevTools WebSocket URL.
    #[must_use]
    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Kill the Chrome process and wait for it to exit.
    pub async fn close(mut self) -> Result<()> {
        debug!("killing Chrome process");
        self.child.kill().await?;
        Ok(())
    }
}

/// Command-line arguments for one Chrome run.
fn build_args(profile_dir: &Path, headless: bool, width: u32, height: u32) -> Vec<String> {
    let mut args = vec![
        "--remote-debugging-port=0".to_string(),
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-sync".to_string(),
        "--disable-background-networking".to_string(),
    ];
    if headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
        args.push("--hide-scrollbars".to_string());
        args.push(format!("--window-size={width},{height}"));
    } else {
        args.push("--start-maximized".to_string());
    }
    args.push("about:blank".to_string());
    args
}

/// Extract the WebSocket URL from Chrome's announcement line, if this is it.
fn parse_devtools_line(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("DevTools listening on ")?;
    rest.starts_with("ws://").then_some(rest)
}

/// First line of a `DevToolsActivePort` file is the port number.
fn parse_port_file(contents: &str) -> Option<u16> {
    contents.lines().next()?.trim().parse().ok()
}

/// Fallback endpoint discovery via the profile's port file and the
/// `/json/version` HTTP endpoint.
async fn endpoint_from_port_file(profile: &Path) -> Result<String> {
    let port_file = profile.join("DevToolsActivePort");
    let contents = tokio::fs::read_to_string(&port_file)
        .await
        .map_err(|_| BrowserError::Launch("Chrome never reported a DevTools endpoint".into()))?;
    let port = parse_port_file(&contents).ok_or_else(|| {
        BrowserError::Launch(format!("malformed DevToolsActivePort file: {contents:?}"))
    })?;
    debug!(port, "falling back to DevToolsActivePort discovery");

    let version: serde_json::Value = reqwest::get(format!("http://127.0.0.1:{port}/json/version"))
        .await?
        .json()
        .await?;
    version
        .get("webSocketDebuggerUrl")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            BrowserError::Launch("/json/version response lacked webSocketDebuggerUrl".into())
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
