//! # blockshot-browser
//!
//! Chrome automation over the DevTools protocol, speaking raw CDP on a
//! WebSocket. No browser-driver dependency; just the handful of domains the
//! capture pipeline needs.
//!
//! - [`chrome`]: locate a Chrome/Chromium binary on this machine
//! - [`launcher`]: spawn Chrome with a throwaway profile and find its
//!   DevTools endpoint
//! - [`connection`]: the WebSocket message loop (request/response routing)
//! - [`session`]: [`Browser`] and [`Page`] handles over that connection
//! - [`types`]: shared protocol payload types
//!
//! Integration tests that drive a real Chrome live behind the
//! `browser-integration` feature.

#![deny(unsafe_code)]

pub mod chrome;
pub mod connection;
pub mod error;
pub mod launcher;
pub mod session;
pub mod types;

pub use chrome::find_chrome;
pub use connection::CdpConnection;
pub use error::{BrowserError, Result};
pub use launcher::{ChromeLauncher, ChromeProcess};
pub use session::{Browser, Page};
pub use types::Region;
