//! Link status and reconnect throttling.
//!
//! The fetch pipeline only reads this; the loop that drives reconnect
//! attempts is the single writer.

use std::time::{Duration, Instant};

use wxpanel_core::ConnectivityConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl LinkState {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        }
    }
}

/// Reconnect wait policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait after the first failed attempt
    pub base: Duration,
    /// Cap for the doubling wait; `max == base` gives a fixed interval
    pub max: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(30))
    }
}

impl ReconnectPolicy {
    pub fn fixed(interval: Duration) -> Self {
        Self {
            base: interval,
            max: interval,
        }
    }

    pub fn from_config(config: &ConnectivityConfig) -> Self {
        Self {
            base: config.retry_interval(),
            max: config.max_retry_interval().max(config.retry_interval()),
        }
    }

    /// Wait before the next attempt after `failures` consecutive failures.
    pub fn delay_for_failures(&self, failures: u32) -> Duration {
        // Exponential backoff: base * 2^(failures - 1)
        let exponent = failures.saturating_sub(1).min(31);
        let factor = 2u32.saturating_pow(exponent);
        self.base.saturating_mul(factor).min(self.max)
    }
}

#[derive(Debug, Clone)]
pub struct ConnectivityState {
    state: LinkState,
    last_attempt: Option<Instant>,
    consecutive_failures: u32,
    policy: ReconnectPolicy,
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

impl ConnectivityState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            state: LinkState::Disconnected,
            last_attempt: None,
            consecutive_failures: 0,
            policy,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    pub fn last_attempt(&self) -> Option<Instant> {
        self.last_attempt
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Current wait between attempts.
    pub fn retry_interval(&self) -> Duration {
        self.policy.delay_for_failures(self.consecutive_failures.max(1))
    }

    /// True when not connected and the retry interval has elapsed since the
    /// last recorded attempt (or no attempt was ever made).
    pub fn should_retry(&self, now: Instant) -> bool {
        if self.is_connected() {
            return false;
        }
        match self.last_attempt {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.retry_interval(),
        }
    }

    /// Mark an attempt as started. Stamping `last_attempt` here keeps
    /// `should_retry` false while the attempt is in flight.
    pub fn begin_attempt(&mut self, now: Instant) {
        if self.state != LinkState::Connected {
            self.last_attempt = Some(now);
            self.transition(LinkState::Connecting);
        }
    }

    /// Record the outcome of an attempt.
    pub fn record_attempt(&mut self, now: Instant, succeeded: bool) {
        self.last_attempt = Some(now);
        if succeeded {
            self.consecutive_failures = 0;
            self.transition(LinkState::Connected);
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            self.transition(LinkState::Disconnected);
            tracing::debug!(
                failures = self.consecutive_failures,
                "Next reconnect attempt in {:?}",
                self.retry_interval()
            );
        }
    }

    /// The transport observed the link going away.
    pub fn link_lost(&mut self) {
        if self.state == LinkState::Connected {
            self.transition(LinkState::Disconnected);
        }
    }

    fn transition(&mut self, next: LinkState) {
        if self.state != next {
            tracing::info!("Link {} -> {}", self.state.as_str(), next.as_str());
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECS_30: Duration = Duration::from_secs(30);

    #[test]
    fn test_starts_disconnected_and_retries_immediately() {
        let link = ConnectivityState::default();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(!link.is_connected());
        assert!(link.should_retry(Instant::now()));
    }

    #[test]
    fn test_successful_attempt_connects() {
        let now = Instant::now();
        let mut link = ConnectivityState::default();
        link.begin_attempt(now);
        assert_eq!(link.state(), LinkState::Connecting);

        link.record_attempt(now, true);
        assert!(link.is_connected());
        assert!(!link.should_retry(now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_failed_attempt_waits_retry_interval() {
        let now = Instant::now();
        let mut link = ConnectivityState::new(ReconnectPolicy::fixed(SECS_30));
        link.begin_attempt(now);
        link.record_attempt(now, false);

        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(!link.should_retry(now));
        assert!(!link.should_retry(now + Duration::from_secs(29)));
        assert!(link.should_retry(now + SECS_30));
    }

    #[test]
    fn test_fixed_policy_never_grows() {
        let now = Instant::now();
        let mut link = ConnectivityState::new(ReconnectPolicy::fixed(SECS_30));
        for _ in 0..5 {
            link.record_attempt(now, false);
        }
        assert_eq!(link.retry_interval(), SECS_30);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy {
            base: Duration::from_secs(10),
            max: Duration::from_secs(60),
        };
        assert_eq!(policy.delay_for_failures(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for_failures(2), Duration::from_secs(20));
        assert_eq!(policy.delay_for_failures(3), Duration::from_secs(40));
        assert_eq!(policy.delay_for_failures(4), Duration::from_secs(60));
        assert_eq!(policy.delay_for_failures(40), Duration::from_secs(60));
    }

    #[test]
    fn test_success_resets_backoff() {
        let now = Instant::now();
        let mut link = ConnectivityState::new(ReconnectPolicy {
            base: Duration::from_secs(10),
            max: Duration::from_secs(60),
        });
        link.record_attempt(now, false);
        link.record_attempt(now, false);
        assert_eq!(link.retry_interval(), Duration::from_secs(20));

        link.record_attempt(now, true);
        assert_eq!(link.consecutive_failures(), 0);
        assert_eq!(link.retry_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_no_retry_while_connecting() {
        let now = Instant::now();
        let mut link = ConnectivityState::default();
        link.begin_attempt(now);
        assert!(!link.should_retry(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_link_lost_only_from_connected() {
        let now = Instant::now();
        let mut link = ConnectivityState::default();
        link.begin_attempt(now);
        link.link_lost();
        assert_eq!(link.state(), LinkState::Connecting);

        link.record_attempt(now, true);
        link.link_lost();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(link.should_retry(now + SECS_30));
    }

    #[test]
    fn test_clock_going_backwards_does_not_panic() {
        let now = Instant::now();
        let mut link = ConnectivityState::default();
        link.record_attempt(now + Duration::from_secs(100), false);
        assert!(!link.should_retry(now));
    }

    #[test]
    fn test_policy_from_config() {
        let config = ConnectivityConfig::default();
        let policy = ReconnectPolicy::from_config(&config);
        assert_eq!(policy, ReconnectPolicy::fixed(SECS_30));
    }
}
