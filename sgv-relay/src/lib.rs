//! # sgv-relay
//!
//! The nightsync daemon.
//!
//! This crate wires the sync client into a long-running process that:
//! - Reads its settings from a TOML file
//! - Re-reads a JSON readings file on every sync
//! - Runs the adaptive sync scheduler in the background
//! - Serves manual fetch and push endpoints over HTTP
//!
//! ## Architecture
//!
//! ```text
//! readings.json ──► FileSource ──┐
//!                                ▼
//!        ┌──────────── SyncPipeline ────────────┐
//!        │   SyncScheduler      POST /api/push  │
//!        └──────────────┬───────────────────────┘
//!                       ▼
//!                LedgerClient ──► Nightscout /api/v1/entries.json
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod source;

pub use config::{Config, ConfigError};
pub use error::{RelayError, Result};
pub use server::Relay;
pub use source::FileSource;
