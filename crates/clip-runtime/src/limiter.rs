//! Capture rate limiting.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Gates how often the capture primitive may be invoked.
///
/// One mutable field: the timestamp of the last admitted capture. The
/// check-and-update is a single lock-held critical section with no await
/// inside, so two capture attempts racing through a suspension point can
/// never both pass. Call [`try_acquire`](Self::try_acquire) exactly once
/// per attempt, before any bus traffic, so rejected attempts cost
/// nothing.
pub struct CaptureRateLimiter {
    min_interval: Duration,
    last_capture_at: Mutex<Option<Instant>>,
}

impl CaptureRateLimiter {
    /// A limiter enforcing the given minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_capture_at: Mutex::new(None),
        }
    }

    /// The enforced minimum interval.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Admit the attempt iff at least the minimum interval has passed
    /// since the last admitted one. Rejection does not mutate state, so a
    /// burst of rejected attempts does not push the next admission out.
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut last = self.last_capture_at.lock();
        match *last {
            Some(prev) if now.saturating_duration_since(prev) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// [`try_acquire`](Self::try_acquire) against the current clock.
    pub fn try_acquire_now(&self) -> bool {
        self.try_acquire(Instant::now())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(1000);

    #[test]
    fn first_acquire_is_admitted() {
        let limiter = CaptureRateLimiter::new(INTERVAL);
        assert!(limiter.try_acquire(Instant::now()));
    }

    #[test]
    fn within_interval_rejected_at_boundary_admitted() {
        let limiter = CaptureRateLimiter::new(INTERVAL);
        let t0 = Instant::now();

        assert!(limiter.try_acquire(t0));
        assert!(!limiter.try_acquire(t0 + Duration::from_millis(999)));
        assert!(limiter.try_acquire(t0 + Duration::from_millis(1999)));
    }

    #[test]
    fn exactly_min_interval_is_admitted() {
        let limiter = CaptureRateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        assert!(limiter.try_acquire(t0));
        assert!(limiter.try_acquire(t0 + INTERVAL));
    }

    #[test]
    fn rejection_does_not_mutate_state() {
        let limiter = CaptureRateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        assert!(limiter.try_acquire(t0));

        // A burst of rejected attempts must not push the window out.
        for ms in [100u64, 200, 300, 900] {
            assert!(!limiter.try_acquire(t0 + Duration::from_millis(ms)));
        }
        assert!(limiter.try_acquire(t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn out_of_order_timestamp_is_rejected() {
        let limiter = CaptureRateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        assert!(limiter.try_acquire(t0 + INTERVAL));
        // An earlier clock reading saturates to zero elapsed.
        assert!(!limiter.try_acquire(t0));
    }

    #[test]
    fn rapid_clicks_admit_at_most_window_over_interval_plus_one() {
        let limiter = CaptureRateLimiter::new(INTERVAL);
        let t0 = Instant::now();

        // A click every 100 ms for 5 seconds.
        let admitted = (0..=50)
            .filter(|i| limiter.try_acquire(t0 + Duration::from_millis(i * 100)))
            .count();
        assert!(admitted <= 5000 / 1000 + 1, "admitted {admitted}");
        assert_eq!(admitted, 6);
    }
}
