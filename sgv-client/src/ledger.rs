//! LedgerClient - the destination store interface.
//!
//! This module provides [`LedgerClient`], which reads the most recent record
//! from a Nightscout-compatible `entries` API and appends the readings it
//! does not have yet.
//!
//! # Architecture
//!
//! ```text
//! readings → LedgerClient → Transport → destination
//!                 ↓
//!          sgv-core::reconcile (pure dedup)
//! ```
//!
//! There is no local record of what was delivered. Every push first asks the
//! destination for its latest entry and treats that entry's instant as the
//! high-water mark, which keeps restarts idempotent at the price of one extra
//! request per push.

use async_trait::async_trait;
use sgv_core::{high_water_mark, reconcile};
use sgv_types::{LedgerEntry, Reading};
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Path of the entries collection.
pub const ENTRIES_PATH: &str = "/api/v1/entries.json";

/// Header carrying the hashed shared secret.
pub const API_SECRET_HEADER: &str = "api-secret";

/// Ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The destination refused a write.
    #[error("failed to push entries, status: {status}, body: {body}")]
    Rejected {
        /// Response status.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The destination answered with something other than an entry list.
    #[error("failed to decode latest entries ({reason}), status: {status}, body: {body}")]
    Decode {
        /// Response status.
        status: u16,
        /// Raw response body.
        body: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Entries could not be serialized.
    #[error("failed to encode entries: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination operations the scheduler depends on.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// The most recent stored entry, `None` when the destination is empty.
    async fn fetch_latest(&self) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Write the readings newer than the destination's latest entry.
    ///
    /// Returns the number of entries written (0 means no request was made).
    async fn push(&self, readings: &[Reading]) -> Result<usize, LedgerError>;
}

/// Configuration for LedgerClient.
#[derive(Clone)]
pub struct LedgerConfig {
    /// Base URL of the destination (no trailing slash needed).
    pub base_url: String,
    /// Shared API secret; `None` or empty means unauthenticated requests.
    pub api_secret: Option<String>,
}

impl LedgerConfig {
    /// Create a configuration for an unauthenticated destination.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_secret: None,
        }
    }

    /// Set the shared API secret.
    pub fn with_secret(mut self, secret: &str) -> Self {
        self.api_secret = Some(secret.to_string());
        self
    }
}

impl std::fmt::Debug for LedgerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerConfig")
            .field("base_url", &self.base_url)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "REDACTED"))
            .finish()
    }
}

/// Lowercase hex SHA-1 of the shared secret, as the destination expects.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha1::digest(secret.as_bytes()))
}

/// Client for the destination `entries` API.
pub struct LedgerClient<T: Transport> {
    base_url: String,
    hashed_secret: Option<String>,
    transport: T,
}

impl<T: Transport> LedgerClient<T> {
    /// Create a new LedgerClient.
    pub fn new(config: LedgerConfig, transport: T) -> Self {
        let hashed_secret = config
            .api_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(hash_secret);
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            hashed_secret,
            transport,
        }
    }

    /// Retrieve the single most recent entry.
    pub async fn fetch_latest(&self) -> Result<Option<LedgerEntry>, LedgerError> {
        let url = format!("{}{}?count=1", self.base_url, ENTRIES_PATH);
        let response = self.send(HttpRequest::get(url)).await?;

        if !response.is_success() {
            return Err(LedgerError::Decode {
                reason: "unexpected status".into(),
                status: response.status,
                body: response.body,
            });
        }

        let entries: Vec<LedgerEntry> = match serde_json::from_str(&response.body) {
            Ok(entries) => entries,
            Err(e) => {
                return Err(LedgerError::Decode {
                    reason: e.to_string(),
                    status: response.status,
                    body: response.body,
                })
            }
        };

        Ok(entries.into_iter().next())
    }

    /// Push the readings the destination does not have yet.
    pub async fn push(&self, readings: &[Reading]) -> Result<usize, LedgerError> {
        let latest = self.fetch_latest().await?;
        let mark = latest.as_ref().and_then(high_water_mark);

        let plan = reconcile(readings, mark);
        for skipped in &plan.skipped {
            tracing::debug!(
                timestamp = %skipped.timestamp,
                error = %skipped.error,
                "Dropping reading with unparseable timestamp"
            );
        }

        if plan.is_noop() {
            tracing::debug!(
                "No new readings to push ({} already present)",
                plan.already_present
            );
            return Ok(0);
        }

        let body = serde_json::to_vec(&plan.entries)?;
        let url = format!("{}{}", self.base_url, ENTRIES_PATH);
        let response = self.send(HttpRequest::post_json(url, body)).await?;

        if !response.is_success() {
            return Err(LedgerError::Rejected {
                status: response.status,
                body: response.body,
            });
        }

        tracing::info!("Pushed {} entries", plan.entries.len());
        Ok(plan.entries.len())
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let request = match &self.hashed_secret {
            Some(hashed) => request.with_header(API_SECRET_HEADER, hashed),
            None => request,
        };
        self.transport.execute(request).await
    }
}

#[async_trait]
impl<T: Transport> Ledger for LedgerClient<T> {
    async fn fetch_latest(&self) -> Result<Option<LedgerEntry>, LedgerError> {
        LedgerClient::fetch_latest(self).await
    }

    async fn push(&self, readings: &[Reading]) -> Result<usize, LedgerError> {
        LedgerClient::push(self, readings).await
    }
}
