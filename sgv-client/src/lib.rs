//! # sgv-client
//!
//! Relays glucose readings from a source to a Nightscout-compatible
//! destination and keeps doing so on a cadence that follows the destination.
//!
//! ## Features
//!
//! - **Dedup by instant**: only readings newer than the destination's latest
//!   entry are written, so repeated pushes are no-ops
//! - **Adaptive cadence**: the next sync is due one interval after the
//!   destination's latest entry, with an immediate catch-up when it is stale
//! - **Transport Abstraction**: Pluggable transport layer (reqwest, mock)
//! - **Pure State Machine**: Uses sgv-core for side-effect-free scheduling
//!
//! ## Example
//!
//! ```ignore
//! use sgv_client::{
//!     HttpTransport, LedgerClient, LedgerConfig, SchedulerConfig, SyncPipeline,
//!     SyncScheduler, SystemClock,
//! };
//! use std::sync::Arc;
//!
//! let ledger = LedgerClient::new(
//!     LedgerConfig::new("https://ns.example.com").with_secret("secret"),
//!     HttpTransport::new(std::time::Duration::from_secs(30))?,
//! );
//! let pipeline = Arc::new(SyncPipeline::new(my_source, ledger));
//!
//! // Manual trigger
//! let report = pipeline.sync_once().await?;
//!
//! // Background loop
//! let scheduler = SyncScheduler::new(SchedulerConfig::default(), pipeline, SystemClock);
//! let (handle, task) = scheduler.spawn();
//! handle.stop();
//! task.await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod ledger;
pub mod scheduler;
pub mod source;
pub mod sync;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{
    hash_secret, Ledger, LedgerClient, LedgerConfig, LedgerError, API_SECRET_HEADER, ENTRIES_PATH,
};
pub use scheduler::{SchedulerConfig, SchedulerHandle, SyncScheduler, DEFAULT_SYNC_INTERVAL};
pub use source::{
    Authenticator, GlucoseSource, ProviderError, ProviderSource, RawReading, ReadingFeed,
    SourceError,
};
pub use sync::{SyncError, SyncPipeline, SyncReport};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, MockTransport, Transport, TransportError,
    DEFAULT_TIMEOUT,
};
