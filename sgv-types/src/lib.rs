//! # sgv-types
//!
//! Wire format types for nightsync.
//!
//! This crate provides the data model shared by every nightsync crate:
//! - [`Reading`] - A raw measurement as yielded by a glucose source
//! - [`LedgerEntry`] - A record in the destination `entries` API

#![warn(missing_docs)]
#![warn(clippy::all)]

mod entry;
mod reading;

pub use entry::{LedgerEntry, SGV_KIND};
pub use reading::Reading;
