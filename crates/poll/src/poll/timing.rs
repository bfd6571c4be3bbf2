//! Refresh timing state
//!
//! Pure bookkeeping around `last_time_updated` and the refresh period;
//! the staleness checks are advisory gates evaluated before starting
//! work, not deadlines on in-flight work.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;

/// Current wall-clock time in milliseconds since the Unix epoch
pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timing state for a poll
///
/// `last_time_updated` records the instant of the last successful
/// newer-fetch or successful resync, in epoch milliseconds.
pub(crate) struct Timing {
    last_time_updated: AtomicI64,
    refresh_period_ms: i64,
}

impl Timing {
    pub fn new(refresh_period: Duration) -> Self {
        Self {
            last_time_updated: AtomicI64::new(0),
            refresh_period_ms: refresh_period.as_millis() as i64,
        }
    }

    pub fn refresh_period_ms(&self) -> i64 {
        self.refresh_period_ms
    }

    pub fn last_time_updated(&self) -> i64 {
        self.last_time_updated.load(Ordering::Acquire)
    }

    /// Whether a refresh is due: more than one refresh period has
    /// passed since the last update
    pub fn should_update(&self, now: i64) -> bool {
        now - self.refresh_period_ms > self.last_time_updated()
    }

    /// Record a successful update at `now`
    pub fn mark_updated(&self, now: i64) {
        self.last_time_updated.store(now, Ordering::Release);
    }

    /// Overwrite `last_time_updated`, used when adopting a persisted
    /// sync time (which may move it backward)
    pub fn adopt(&self, timestamp: i64) {
        self.last_time_updated.store(timestamp, Ordering::Release);
    }

    /// Forget the last update so the next staleness check passes
    pub fn reset(&self) {
        self.last_time_updated.store(0, Ordering::Release);
    }

    /// Suppress refreshes by moving `last_time_updated` to the implied
    /// timestamp `now - duration`, only ever forward
    pub fn suppress(&self, now: i64, duration: Duration) {
        let implied = now - duration.as_millis() as i64;
        self.last_time_updated.fetch_max(implied, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_update_when_never_updated() {
        let timing = Timing::new(Duration::from_secs(60));
        assert!(timing.should_update(now_ms()));
    }

    #[test]
    fn test_should_update_gate_boundary() {
        let timing = Timing::new(Duration::from_secs(60));
        let now = 1_000_000;
        timing.mark_updated(now);

        // Exactly one period later the gate is still closed (strict >)
        assert!(!timing.should_update(now + 60_000));
        assert!(timing.should_update(now + 60_001));
    }

    #[test]
    fn test_suppress_only_moves_forward() {
        let timing = Timing::new(Duration::from_secs(60));
        let now = 1_000_000;

        timing.suppress(now, Duration::from_secs(10));
        assert_eq!(timing.last_time_updated(), now - 10_000);

        // A longer suppression implies an older timestamp: no-op
        timing.suppress(now, Duration::from_secs(30));
        assert_eq!(timing.last_time_updated(), now - 10_000);

        // A shorter one moves it forward
        timing.suppress(now, Duration::from_secs(5));
        assert_eq!(timing.last_time_updated(), now - 5_000);
    }

    #[test]
    fn test_reset_reopens_gate() {
        let timing = Timing::new(Duration::from_secs(3600));
        let now = now_ms();
        timing.mark_updated(now);
        assert!(!timing.should_update(now));

        timing.reset();
        assert!(timing.should_update(now));
    }

    #[test]
    fn test_adopt_may_move_backward() {
        let timing = Timing::new(Duration::from_secs(60));
        timing.mark_updated(5_000);
        timing.adopt(1_000);
        assert_eq!(timing.last_time_updated(), 1_000);
    }
}
