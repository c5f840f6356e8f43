//! One fetch-and-push cycle.
//!
//! [`SyncPipeline`] pairs a source with a ledger and runs a single cycle on
//! demand. The scheduler and the manual trigger share one pipeline, and the
//! pipeline serializes cycles internally so the destination never sees
//! overlapping writes from the same instance.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::ledger::{Ledger, LedgerError};
use crate::source::{GlucoseSource, SourceError};

/// Sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source failed.
    #[error("error getting glucose data: {0}")]
    Source(#[from] SourceError),

    /// The destination failed.
    #[error("error pushing data to destination: {0}")]
    Ledger(#[from] LedgerError),
}

/// Result of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Readings returned by the source.
    pub fetched: usize,
    /// Entries written to the destination.
    pub pushed: usize,
}

/// A source and a ledger, with cycles run one at a time.
pub struct SyncPipeline<S, L> {
    source: S,
    ledger: L,
    gate: Mutex<()>,
}

impl<S: GlucoseSource, L: Ledger> SyncPipeline<S, L> {
    /// Create a new pipeline.
    pub fn new(source: S, ledger: L) -> Self {
        Self {
            source,
            ledger,
            gate: Mutex::new(()),
        }
    }

    /// Fetch from the source and push whatever the destination is missing.
    ///
    /// Waits for any cycle already in flight to finish first.
    pub async fn sync_once(&self) -> Result<SyncReport, SyncError> {
        let _cycle = self.gate.lock().await;

        let readings = self.source.fetch().await?;
        let pushed = self.ledger.push(&readings).await?;

        Ok(SyncReport {
            fetched: readings.len(),
            pushed,
        })
    }

    /// The source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerClient, LedgerConfig};
    use crate::transport::{HttpResponse, MockTransport};
    use async_trait::async_trait;
    use sgv_types::Reading;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct FixedSource(Vec<Reading>);

    #[async_trait]
    impl GlucoseSource for FixedSource {
        async fn fetch(&self) -> Result<Vec<Reading>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl GlucoseSource for FailingSource {
        async fn fetch(&self) -> Result<Vec<Reading>, SourceError> {
            Err(SourceError::Decode("boom".into()))
        }
    }

    /// Source that records how many fetches overlap.
    #[derive(Default)]
    struct SlowSource {
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    #[async_trait]
    impl GlucoseSource for SlowSource {
        async fn fetch(&self) -> Result<Vec<Reading>, SourceError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![])
        }
    }

    fn ledger() -> LedgerClient<MockTransport> {
        LedgerClient::new(LedgerConfig::new("http://ns"), MockTransport::new())
    }

    #[tokio::test]
    async fn reports_fetched_and_pushed() {
        let ledger = ledger();
        ledger.transport().queue_response(HttpResponse::new(200, "[]"));
        ledger.transport().queue_response(HttpResponse::new(200, "[]"));
        let pipeline = SyncPipeline::new(
            FixedSource(vec![
                Reading::new("2024-01-01T00:00:00Z", 100.0),
                Reading::new("bogus", 100.0),
            ]),
            ledger,
        );

        let report = pipeline.sync_once().await.unwrap();

        assert_eq!(report, SyncReport { fetched: 2, pushed: 1 });
    }

    #[tokio::test]
    async fn source_failure_skips_destination() {
        let pipeline = SyncPipeline::new(FailingSource, ledger());

        let err = pipeline.sync_once().await.unwrap_err();

        assert!(matches!(err, SyncError::Source(_)));
        assert!(pipeline.ledger().transport().requests().is_empty());
    }

    #[tokio::test]
    async fn ledger_failure_is_reported() {
        let ledger = ledger();
        ledger.transport().fail_next("refused");
        let pipeline = SyncPipeline::new(FixedSource(vec![]), ledger);

        let err = pipeline.sync_once().await.unwrap_err();

        assert!(matches!(err, SyncError::Ledger(LedgerError::Transport(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_cycles_are_serialized() {
        let ledger = ledger();
        for _ in 0..4 {
            ledger.transport().queue_response(HttpResponse::new(200, "[]"));
        }
        let pipeline = Arc::new(SyncPipeline::new(SlowSource::default(), ledger));

        let a = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.sync_once().await }
        });
        let b = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.sync_once().await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(pipeline.source().max_active.load(Ordering::SeqCst), 1);
    }
}
