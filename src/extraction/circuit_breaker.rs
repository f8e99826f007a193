//! Circuit breaker guarding the LLM endpoint
//!
//! After `failure_threshold` consecutive failures the breaker opens and
//! extraction goes straight to the fallback until `reset_timeout` elapses.
//! The next call is then let through as a trial (half-open); its outcome
//! closes or re-opens the breaker.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: usize,
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    consecutive_failures: usize,
    opened_at: Option<Instant>,
}

/// Consecutive-failure breaker for one upstream
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
            config,
        }
    }

    // Breaker bookkeeping stays usable even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether calls should be rejected right now
    pub fn is_open(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => false,
            BreakerState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.reset_timeout)
                    .unwrap_or(true);
                if elapsed {
                    inner.state = BreakerState::HalfOpen;
                }
                !elapsed
            }
        }
    }

    pub fn mark_success(&self) {
        let mut inner = self.lock();
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    pub fn mark_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;

        let trip = inner.state == BreakerState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold;
        if trip {
            inner.state = BreakerState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> usize {
        self.lock().consecutive_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: usize, reset: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            reset_timeout: reset,
        })
    }

    #[test]
    fn test_opens_after_consecutive_failures() {
        let breaker = breaker(3, Duration::from_secs(30));
        breaker.mark_failure();
        breaker.mark_failure();
        assert!(!breaker.is_open());

        breaker.mark_failure();
        assert!(breaker.is_open());
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let breaker = breaker(3, Duration::from_secs(30));
        breaker.mark_failure();
        breaker.mark_failure();
        breaker.mark_success();
        breaker.mark_failure();

        assert_eq!(breaker.consecutive_failures(), 1);
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_half_open_trial() {
        let breaker = breaker(2, Duration::from_millis(50));
        breaker.mark_failure();
        breaker.mark_failure();
        assert!(breaker.is_open());

        std::thread::sleep(Duration::from_millis(80));
        assert!(!breaker.is_open());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        // A failed trial re-opens immediately
        breaker.mark_failure();
        assert!(breaker.is_open());
    }
}
