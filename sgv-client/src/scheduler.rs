//! Background sync scheduler.
//!
//! [`SyncScheduler`] drives the pure [`Phase`] machine from `sgv-core`:
//! it feeds events in, performs the returned actions, and turns their
//! outcomes back into events. All timing goes through a [`Clock`], and the
//! only way out of the loop is the stop token held by [`SchedulerHandle`].
//!
//! Nothing about past cycles is kept between decisions. Each time the loop
//! needs to know where the destination stands it asks the destination.

use chrono::TimeDelta;
use sgv_core::{high_water_mark, Action, Event, Phase};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{Clock, SystemClock};
use crate::ledger::Ledger;
use crate::source::GlucoseSource;
use crate::sync::SyncPipeline;

/// Default interval between syncs (5 minutes).
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Expected cadence of new readings; also the fallback wait after errors.
    pub sync_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sync_interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

/// Stop switch for a running scheduler.
///
/// Cloning is cheap; every clone controls the same scheduler. Stopping is
/// idempotent and may happen before the scheduler starts.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    stop: CancellationToken,
}

impl SchedulerHandle {
    /// Ask the scheduler to stop.
    ///
    /// A pending wait ends immediately. A sync already in flight finishes
    /// first and the loop exits right after it.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Whether stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }
}

/// Runs sync cycles until stopped.
pub struct SyncScheduler<S, L, C = SystemClock> {
    config: SchedulerConfig,
    pipeline: Arc<SyncPipeline<S, L>>,
    clock: C,
    stop: CancellationToken,
}

impl<S, L, C> SyncScheduler<S, L, C>
where
    S: GlucoseSource + 'static,
    L: Ledger + 'static,
    C: Clock + 'static,
{
    /// Create a scheduler around a shared pipeline.
    pub fn new(config: SchedulerConfig, pipeline: Arc<SyncPipeline<S, L>>, clock: C) -> Self {
        Self {
            config,
            pipeline,
            clock,
            stop: CancellationToken::new(),
        }
    }

    /// A handle that can stop this scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            stop: self.stop.clone(),
        }
    }

    /// Run on a background task.
    pub fn spawn(self) -> (SchedulerHandle, JoinHandle<()>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run()))
    }

    /// Run the loop on the current task until stopped.
    pub async fn run(self) {
        let interval = TimeDelta::from_std(self.config.sync_interval).unwrap_or(TimeDelta::MAX);
        tracing::info!(
            "Sync scheduler started (interval: {}s)",
            self.config.sync_interval.as_secs()
        );

        let mut phase = Phase::new();
        let mut event = Event::Start;

        loop {
            if self.stop.is_cancelled() {
                event = Event::StopRequested;
            }

            let (next, actions) = phase.on_event(event, self.clock.now(), interval);
            if let Phase::Syncing { catch_up: true } = next {
                tracing::info!("Destination is more than one interval behind, catching up");
            }
            phase = next;

            let mut outcome = None;
            for action in actions {
                outcome = self.perform(action).await;
            }

            match outcome {
                Some(next_event) => event = next_event,
                None => break,
            }
        }

        tracing::info!("Sync scheduler stopped");
    }

    async fn perform(&self, action: Action) -> Option<Event> {
        match action {
            Action::RunSync => match self.pipeline.sync_once().await {
                Ok(report) => {
                    tracing::debug!(
                        fetched = report.fetched,
                        pushed = report.pushed,
                        "Sync complete"
                    );
                    Some(Event::SyncSucceeded)
                }
                Err(e) => {
                    tracing::warn!("Sync failed: {}", e);
                    Some(Event::SyncFailed)
                }
            },

            Action::FetchLatest => match self.pipeline.ledger().fetch_latest().await {
                Ok(latest) => Some(Event::LatestFetched {
                    at: latest.as_ref().and_then(high_water_mark),
                }),
                Err(e) => {
                    tracing::warn!("Failed to read latest entry: {}", e);
                    Some(Event::LatestUnavailable)
                }
            },

            Action::WaitUntil { deadline } => {
                tracing::debug!("Next sync at {}", deadline.to_rfc3339());
                tokio::select! {
                    biased;
                    _ = self.stop.cancelled() => Some(Event::StopRequested),
                    _ = self.clock.sleep_until(deadline) => Some(Event::WaitElapsed),
                }
            }

            Action::Halt => None,
        }
    }
}
