//! # blockshot-core
//!
//! Shared foundation for the blockshot capture tool.
//!
//! This crate provides the pieces every other blockshot crate leans on:
//!
//! - **Constants**: the selector contract and timing defaults in one place
//! - **Settings**: [`settings::CaptureSettings`] with `BLOCKSHOT_*` env overrides
//! - **Artifact naming**: the gapless run counter and diagram-path derivation
//! - **Run preparation**: URL-safe directory names, output-directory setup
//! - **Logging**: stderr `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod artifact;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod output;
pub mod settings;
