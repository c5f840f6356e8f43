//! Time source for the scheduler.
//!
//! The scheduler never reads the wall clock or sleeps directly; it goes
//! through [`Clock`] so tests can drive time by hand with [`ManualClock`].
//! Waits are not cancellable on their own. The scheduler races them against
//! its stop token.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Notify};

/// Current time plus a wait primitive.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Resolve once `deadline` has passed. Returns immediately for past deadlines.
    async fn sleep_until(&self, deadline: DateTime<Utc>);
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        if let Ok(remaining) = (deadline - Utc::now()).to_std() {
            tokio::time::sleep(remaining).await;
        }
    }
}

/// Hand-driven clock for tests.
///
/// Time only moves through [`advance`](Self::advance) or [`set`](Self::set).
/// Sleepers are released once the clock reaches their deadline, and every
/// call to `sleep_until` is recorded so tests can assert on what the
/// scheduler asked for.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<ManualClockInner>,
}

#[derive(Debug)]
struct ManualClockInner {
    now: Mutex<DateTime<Utc>>,
    deadlines: Mutex<Vec<DateTime<Utc>>>,
    moved: Notify,
    sleeps: watch::Sender<usize>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        let (sleeps, _) = watch::channel(0);
        Self {
            inner: Arc::new(ManualClockInner {
                now: Mutex::new(start),
                deadlines: Mutex::new(Vec::new()),
                moved: Notify::new(),
                sleeps,
            }),
        }
    }

    /// Move time forward, waking any sleeper whose deadline has passed.
    pub fn advance(&self, by: TimeDelta) {
        let mut now = self.inner.now.lock().unwrap();
        *now += by;
        drop(now);
        self.inner.moved.notify_waiters();
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.inner.now.lock().unwrap() = to;
        self.inner.moved.notify_waiters();
    }

    /// Every deadline passed to `sleep_until`, in call order.
    pub fn deadlines(&self) -> Vec<DateTime<Utc>> {
        self.inner.deadlines.lock().unwrap().clone()
    }

    /// Wait until `sleep_until` has been called at least `count` times.
    pub async fn wait_for_sleeps(&self, count: usize) {
        let mut rx = self.inner.sleeps.subscribe();
        let _ = rx.wait_for(|n| *n >= count).await;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.inner.now.lock().unwrap()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        self.inner.deadlines.lock().unwrap().push(deadline);
        self.inner.sleeps.send_modify(|n| *n += 1);

        loop {
            let moved = self.inner.moved.notified();
            tokio::pin!(moved);
            moved.as_mut().enable();

            if self.now() >= deadline {
                return;
            }
            moved.await;
        }
    }
}
