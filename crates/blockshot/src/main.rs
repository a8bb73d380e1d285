//! # blockshot
//!
//! Command-line entry point: launch Chrome, walk the target page block by
//! block, and write the screenshots to an output directory.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use blockshot_browser::{Browser, ChromeLauncher, find_chrome};
use blockshot_capture::RunOutcome;
use blockshot_core::logging;
use blockshot_core::output::{prepare_output_dir, safe_dir_name};
use blockshot_core::settings::CaptureSettings;

/// Capture every content block of a page as screenshots.
#[derive(Parser, Debug)]
#[command(name = "blockshot", about = "Capture page content blocks as screenshots", version)]
struct Cli {
    /// Page URL to capture.
    url: String,

    /// Directory receiving one subdirectory per captured page.
    #[arg(long, default_value = "captures")]
    out_dir: PathBuf,

    /// Run Chrome with a visible window.
    #[arg(long)]
    headful: bool,

    /// Chrome binary to use instead of auto-discovery.
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Next-block discovery timeout, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Settings for this run: env overrides first, then CLI flags on top.
fn settings_from(cli: &Cli) -> CaptureSettings {
    let mut settings = CaptureSettings::from_env();
    if cli.headful {
        settings.headless = false;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.discovery_timeout_ms = secs.saturating_mul(1000);
    }
    settings
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_subscriber(logging::level_for_verbosity(cli.verbose));

    let settings = settings_from(&cli);
    let run_dir = cli.out_dir.join(safe_dir_name(&cli.url));
    prepare_output_dir(&run_dir)
        .with_context(|| format!("preparing output directory {}", run_dir.display()))?;

    let binary = match &cli.chrome {
        Some(path) => path.clone(),
        None => find_chrome().context("no Chrome or Chromium found; point --chrome at a binary")?,
    };
    tracing::info!(binary = %binary.display(), headless = settings.headless, "launching browser");

    let process = ChromeLauncher::new(binary)
        .with_headless(settings.headless)
        .with_window_size(settings.viewport_width, settings.viewport_height)
        .launch()
        .await
        .context("launching Chrome")?;
    let browser = Browser::connect(process.ws_url())
        .await
        .context("connecting to DevTools")?;

    let result = blockshot_capture::execute(&browser, &cli.url, &settings, &run_dir).await;

    // Teardown happens before the result is inspected so a failed run
    // never leaves a Chrome process behind.
    if let Err(err) = browser.close().await {
        tracing::debug!(error = %err, "browser close failed");
    }
    if let Err(err) = process.close().await {
        tracing::debug!(error = %err, "chrome teardown failed");
    }

    let report = result.context("capture run failed")?;
    match report.outcome {
        RunOutcome::Exhausted => {
            tracing::info!(
                blocks = report.blocks_processed,
                dir = %run_dir.display(),
                "capture complete"
            );
        }
        RunOutcome::Reverted => {
            tracing::warn!(
                blocks = report.blocks_processed,
                dir = %run_dir.display(),
                "capture stopped after a scroll regression; earlier artifacts are on disk"
            );
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
