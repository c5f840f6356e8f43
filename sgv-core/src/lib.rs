//! # sgv-core
//!
//! Pure logic for nightsync (no I/O, instant tests).
//!
//! This crate implements the scheduling state machine and the dedup
//! algorithm without any network or clock access, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects:
//! - Same readings and high-water mark → same entries to write
//! - Same phase, event and time → same next phase and actions
//!
//! The actual I/O (HTTP, sleeping) is performed by `sgv-client`, which
//! interprets the actions produced by the scheduler machine.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod claims;
pub mod reconcile;
pub mod schedule;
pub mod timestamp;
pub mod units;

pub use claims::{user_id_from_claims, user_id_from_token, ClaimError, USER_ID_CLAIMS};
pub use reconcile::{high_water_mark, reconcile, Reconciliation, SkippedReading};
pub use schedule::{Action, Event, Phase};
pub use timestamp::{parse_reading_time, TimestampError};
pub use units::{mmol_to_mgdl, MGDL_PER_MMOL};
