//! Sync scheduling state machine.
//!
//! This module provides a pure, side-effect-free state machine that decides
//! when the next sync should run. It takes events as input and produces a new
//! phase plus a list of actions to execute; the caller performs the actual
//! I/O (running a sync, querying the destination, sleeping).
//!
//! Cadence follows the destination rather than a fixed timer: after a
//! successful sync the next wake is one interval after the destination's most
//! recent entry. When that moment has already passed the destination is
//! stale, so one catch-up sync runs immediately and the following wait is a
//! plain interval. Every failure degrades to a plain interval wait.

use chrono::{DateTime, TimeDelta, Utc};

/// Scheduler phase - NO I/O, just transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, nothing has run yet.
    Starting,
    /// A sync (fetch from source, push to destination) is in flight.
    Syncing {
        /// Whether this is the extra sync for a stale destination.
        catch_up: bool,
    },
    /// Sync succeeded; the destination's latest entry is being queried.
    Deciding,
    /// Idle until the deadline or a stop request.
    Waiting {
        /// When the next sync is due.
        until: DateTime<Utc>,
    },
    /// Terminal.
    Stopped,
}

impl Phase {
    /// Create a machine in the Starting phase.
    pub fn new() -> Self {
        Self::Starting
    }

    /// Process an event and return the new phase plus actions to execute.
    ///
    /// `now` is the current time and `interval` the configured sync interval.
    /// Events that make no sense in the current phase leave it unchanged.
    pub fn on_event(
        self,
        event: Event,
        now: DateTime<Utc>,
        interval: TimeDelta,
    ) -> (Self, Vec<Action>) {
        match (self, event) {
            (Self::Stopped, _) => (Self::Stopped, vec![]),
            (_, Event::StopRequested) => (Self::Stopped, vec![Action::Halt]),

            (Self::Starting, Event::Start) => {
                (Self::Syncing { catch_up: false }, vec![Action::RunSync])
            }

            (Self::Syncing { catch_up: false }, Event::SyncSucceeded) => {
                (Self::Deciding, vec![Action::FetchLatest])
            }
            (Self::Syncing { catch_up: true }, Event::SyncSucceeded) => {
                wait_one_interval(now, interval)
            }
            (Self::Syncing { .. }, Event::SyncFailed) => wait_one_interval(now, interval),

            (Self::Deciding, Event::LatestFetched { at: None }) => {
                wait_one_interval(now, interval)
            }
            (Self::Deciding, Event::LatestFetched { at: Some(at) }) => {
                let candidate = advance(at, interval);
                if candidate < now {
                    (Self::Syncing { catch_up: true }, vec![Action::RunSync])
                } else {
                    (
                        Self::Waiting { until: candidate },
                        vec![Action::WaitUntil { deadline: candidate }],
                    )
                }
            }
            (Self::Deciding, Event::LatestUnavailable) => wait_one_interval(now, interval),

            (Self::Waiting { .. }, Event::WaitElapsed) => {
                (Self::Syncing { catch_up: false }, vec![Action::RunSync])
            }

            // Invalid transitions - stay in current phase
            (phase, _) => (phase, vec![]),
        }
    }

    /// Check whether the machine has terminated.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// The pending wake time, if waiting.
    pub fn next_wake(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Waiting { until } => Some(*until),
            _ => None,
        }
    }
}

impl Default for Phase {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The scheduler was started.
    Start,
    /// Fetch and push completed (whether or not anything was written).
    SyncSucceeded,
    /// Fetch or push failed.
    SyncFailed,
    /// The destination's latest entry was read.
    LatestFetched {
        /// Instant of the latest entry, `None` when the destination is empty.
        at: Option<DateTime<Utc>>,
    },
    /// The destination's latest entry could not be read.
    LatestUnavailable,
    /// The wait deadline passed.
    WaitElapsed,
    /// Stop was requested.
    StopRequested,
}

/// Actions to be executed by the scheduler driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Fetch readings from the source and push new ones.
    RunSync,
    /// Query the destination's most recent entry.
    FetchLatest,
    /// Sleep until the deadline (interruptible by stop).
    WaitUntil {
        /// Wake time.
        deadline: DateTime<Utc>,
    },
    /// Leave the loop.
    Halt,
}

fn wait_one_interval(now: DateTime<Utc>, interval: TimeDelta) -> (Phase, Vec<Action>) {
    let deadline = advance(now, interval);
    (
        Phase::Waiting { until: deadline },
        vec![Action::WaitUntil { deadline }],
    )
}

fn advance(at: DateTime<Utc>, interval: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(interval).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
