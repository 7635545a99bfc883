//! Staleness gate and the published "current" snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::Notify;
use wxpanel_core::WeatherConfig;

use crate::connectivity::ConnectivityState;
use crate::fetcher::{FetchError, WeatherFetcher};
use crate::types::WeatherSnapshot;

/// Coarse refresh status shown next to the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStatus {
    /// No attempt has finished yet
    #[default]
    Pending,
    /// Last attempt succeeded
    Fresh,
    /// Last attempt was skipped because the link is down
    Offline,
    /// Last attempt failed; carries the status-line text
    Failed(&'static str),
}

impl SyncStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "Updating...",
            SyncStatus::Fresh => "",
            SyncStatus::Offline => "Offline",
            SyncStatus::Failed(message) => *message,
        }
    }
}

/// What readers of the slot see.
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub snapshot: Arc<WeatherSnapshot>,
    pub status: SyncStatus,
}

/// Single-writer, multi-reader handoff of the latest snapshot.
///
/// Cloning shares the same slot. Writers swap the whole `Arc`, so a reader
/// never sees a half-built snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSlot {
    inner: Arc<RwLock<Published>>,
    notify: Arc<Notify>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest known snapshot, possibly the `valid == false` placeholder.
    pub fn current(&self) -> Arc<WeatherSnapshot> {
        Arc::clone(&self.inner.read().snapshot)
    }

    pub fn status(&self) -> SyncStatus {
        self.inner.read().status
    }

    pub fn published(&self) -> Published {
        self.inner.read().clone()
    }

    /// Wait for the next publish. A publish with no waiter is remembered.
    pub async fn changed(&self) {
        self.notify.notified().await;
    }

    fn publish(&self, snapshot: Arc<WeatherSnapshot>) {
        {
            let mut guard = self.inner.write();
            guard.snapshot = snapshot;
            guard.status = SyncStatus::Fresh;
        }
        self.notify.notify_one();
    }

    fn set_status(&self, status: SyncStatus) {
        {
            let mut guard = self.inner.write();
            if guard.status == status {
                return;
            }
            guard.status = status;
        }
        self.notify.notify_one();
    }
}

#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// The last success is younger than the update interval
    NotDue,
    /// A recent failure is still being paced
    Backoff { retry_in: Duration },
    Updated(Arc<WeatherSnapshot>),
    Failed(FetchError),
}

/// Doubling pause after failed fetches.
#[derive(Debug, Clone)]
struct FailureBackoff {
    initial: Duration,
    max: Duration,
    failures: u32,
    until: Option<Instant>,
}

impl FailureBackoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
            failures: 0,
            until: None,
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // Exponential backoff: initial * 2^attempt
        let factor = 2u32.saturating_pow(attempt.min(31));
        self.initial.saturating_mul(factor).min(self.max)
    }

    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.until
            .map(|until| until.saturating_duration_since(now))
            .filter(|left| !left.is_zero())
    }

    fn arm(&mut self, now: Instant) -> Duration {
        if self.initial.is_zero() {
            return Duration::ZERO;
        }
        let delay = self.delay_for_attempt(self.failures);
        self.failures = self.failures.saturating_add(1);
        self.until = Some(now + delay);
        delay
    }

    fn reset(&mut self) {
        self.failures = 0;
        self.until = None;
    }
}

/// Decides when to refresh and owns the last-success bookkeeping.
///
/// Exactly one scheduler writes a given [`SnapshotSlot`].
#[derive(Debug)]
pub struct UpdateScheduler {
    fetcher: WeatherFetcher,
    update_interval: Duration,
    last_success: Option<Instant>,
    backoff: FailureBackoff,
    slot: SnapshotSlot,
}

impl UpdateScheduler {
    /// Scheduler without failure pacing.
    pub fn new(fetcher: WeatherFetcher, update_interval: Duration, slot: SnapshotSlot) -> Self {
        Self {
            fetcher,
            update_interval,
            last_success: None,
            backoff: FailureBackoff::new(Duration::ZERO, Duration::ZERO),
            slot,
        }
    }

    pub fn from_config(config: &WeatherConfig, slot: SnapshotSlot) -> Result<Self, FetchError> {
        let fetcher = WeatherFetcher::new(config)?;
        Ok(Self::new(fetcher, config.update_interval(), slot)
            .with_failure_backoff(config.failure_backoff(), config.max_failure_backoff()))
    }

    /// Pause `initial`, doubling up to `max`, after each failed fetch.
    /// A zero `initial` disables pacing.
    pub fn with_failure_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.backoff = FailureBackoff::new(initial, max);
        self
    }

    pub fn update_interval(&self) -> Duration {
        self.update_interval
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    pub fn slot(&self) -> &SnapshotSlot {
        &self.slot
    }

    pub fn current_weather(&self) -> Arc<WeatherSnapshot> {
        self.slot.current()
    }

    /// Always due before the first success.
    pub fn needs_update(&self, now: Instant) -> bool {
        match self.last_success {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.update_interval,
        }
    }

    /// Run at most one fetch attempt if a refresh is due.
    ///
    /// Failures leave the published snapshot untouched.
    pub async fn tick(&mut self, now: Instant, link: &ConnectivityState) -> UpdateOutcome {
        if !self.needs_update(now) {
            return UpdateOutcome::NotDue;
        }
        if let Some(retry_in) = self.backoff.remaining(now) {
            return UpdateOutcome::Backoff { retry_in };
        }

        match self.fetcher.fetch(link).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.slot.publish(Arc::clone(&snapshot));
                self.last_success = Some(now);
                self.backoff.reset();
                UpdateOutcome::Updated(snapshot)
            }
            Err(FetchError::NotConnected) => {
                self.slot.set_status(SyncStatus::Offline);
                UpdateOutcome::Failed(FetchError::NotConnected)
            }
            Err(err) => {
                let pause = self.backoff.arm(now);
                if pause.is_zero() {
                    tracing::warn!("Weather refresh failed: {}", err);
                } else {
                    tracing::warn!("Weather refresh failed: {}; next attempt in {:?}", err, pause);
                }
                self.slot.set_status(SyncStatus::Failed(err.user_message()));
                UpdateOutcome::Failed(err)
            }
        }
    }
}
