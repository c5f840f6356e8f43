//! Daemon state shared by the scheduler and the HTTP surface.
//!
//! [`Relay`] owns the one [`SyncPipeline`] of this instance. The background
//! scheduler and the manual endpoints both run cycles through it, so their
//! writes to the destination never overlap.

use crate::config::Config;
use crate::error::Result;
use crate::source::FileSource;
use sgv_client::{
    HttpTransport, LedgerClient, SchedulerHandle, SyncPipeline, SyncScheduler, SystemClock,
    Transport,
};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::task::JoinHandle;

/// Pipeline type used by the daemon.
pub type RelayPipeline<T> = SyncPipeline<FileSource, LedgerClient<T>>;

/// Main daemon state.
pub struct Relay<T: Transport = HttpTransport> {
    config: Config,
    pipeline: Arc<RelayPipeline<T>>,
    scheduler: OnceLock<SchedulerHandle>,
    started: Instant,
}

impl<T: Transport + 'static> std::fmt::Debug for Relay<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("config", &self.config)
            .field("scheduler_running", &self.scheduler_running())
            .finish_non_exhaustive()
    }
}

impl Relay<HttpTransport> {
    /// Build the daemon from configuration, talking HTTP to the destination.
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport + 'static> Relay<T> {
    /// Create a relay over the given transport.
    pub fn new(config: Config, transport: T) -> Self {
        let ledger = LedgerClient::new(config.ledger(), transport);
        let source = FileSource::from_config(&config.source);
        Self {
            config,
            pipeline: Arc::new(SyncPipeline::new(source, ledger)),
            scheduler: OnceLock::new(),
            started: Instant::now(),
        }
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the shared pipeline.
    pub fn pipeline(&self) -> &RelayPipeline<T> {
        &self.pipeline
    }

    /// Start the background scheduler.
    ///
    /// Returns `None` when the scheduler is disabled in the config or was
    /// already started.
    pub fn start_scheduler(&self) -> Option<JoinHandle<()>> {
        if !self.config.scheduler.enabled {
            tracing::info!("Sync scheduler disabled");
            return None;
        }

        let scheduler = SyncScheduler::new(
            self.config.schedule(),
            Arc::clone(&self.pipeline),
            SystemClock,
        );
        if self.scheduler.set(scheduler.handle()).is_err() {
            tracing::warn!("Sync scheduler already started");
            return None;
        }
        let (_, task) = scheduler.spawn();
        Some(task)
    }

    /// Stop the background scheduler, if any. Safe to call repeatedly.
    pub fn stop_scheduler(&self) {
        if let Some(handle) = self.scheduler.get() {
            handle.stop();
        }
    }

    /// Whether a scheduler was started and has not been stopped.
    pub fn scheduler_running(&self) -> bool {
        self.scheduler.get().is_some_and(|h| !h.is_stopped())
    }

    /// Seconds since the relay was created.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgv_client::{HttpResponse, MockTransport};
    use std::time::Duration;

    fn test_config(readings: &std::path::Path) -> Config {
        let mut config = Config::for_url("http://ns.test");
        config.source.readings_file = readings.to_path_buf();
        config.scheduler.sync_interval_secs = 3600;
        config
    }

    #[tokio::test]
    async fn disabled_scheduler_does_not_start() {
        let mut config = Config::for_url("http://ns.test");
        config.scheduler.enabled = false;
        let relay = Relay::new(config, MockTransport::new());

        assert!(relay.start_scheduler().is_none());
        assert!(!relay.scheduler_running());
    }

    #[tokio::test]
    async fn scheduler_starts_once_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let readings = dir.path().join("readings.json");
        std::fs::write(&readings, "[]").unwrap();
        let transport = MockTransport::new();
        transport.queue_response(HttpResponse::new(200, "[]"));
        transport.queue_response(HttpResponse::new(200, "[]"));
        let relay = Relay::new(test_config(&readings), transport);

        let task = relay.start_scheduler().expect("scheduler should start");
        assert!(relay.scheduler_running());
        assert!(relay.start_scheduler().is_none());

        relay.stop_scheduler();
        relay.stop_scheduler();
        assert!(!relay.scheduler_running());
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("scheduler should stop promptly")
            .unwrap();
    }

    #[test]
    fn debug_hides_secret() {
        let mut config = Config::for_url("http://ns.test");
        config.nightscout.api_secret = Some("topsecret".into());
        let relay = Relay::new(config, MockTransport::new());

        let debug = format!("{:?}", relay);
        assert!(!debug.contains("topsecret"));
    }
}
