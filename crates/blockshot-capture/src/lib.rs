//! # blockshot-capture
//!
//! The capture pipeline: walk a page's content blocks in document order and
//! screenshot each one, with a companion image for blocks that embed an
//! interactive frame.
//!
//! - [`driver`]: the traversal state machine (forward-only, visit-once)
//! - [`strategy`]: per-block capture, plain or embedded
//! - [`settle`]: the readiness protocol for embedded frame tabs
//! - [`surface`]: the traits the pipeline drives the browser through
//! - [`live`]: the real surface over a CDP page session
//! - [`sink`]: artifact persistence
//! - [`run`]: one-call orchestration of a whole run
//!
//! The driver and strategy are fully exercisable against scripted fakes;
//! only [`live`] and [`run`] touch a real browser.

#![deny(unsafe_code)]

pub mod block;
pub mod driver;
pub mod error;
pub mod live;
pub mod run;
pub mod settle;
pub mod sink;
pub mod strategy;
pub mod surface;

pub use block::{BlockId, BlockKind};
pub use driver::{RunOutcome, RunReport, TraversalDriver};
pub use error::{CaptureError, Result};
pub use live::PageSurface;
pub use run::execute;
pub use settle::SettleProtocol;
pub use sink::FsArtifactSink;
pub use strategy::{BlockHandler, CaptureStrategy};
pub use surface::{ArtifactSink, AuxSurface, CaptureSurface};
