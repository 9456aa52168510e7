//! Three-state circuit breaker shared by per-proxy and per-operation callers.
//!
//! The same type backs both granularities named in the component design: the
//! registry keeps one breaker per [`crate::proxy::Proxy`], and the executor
//! keeps one per operation name.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub threshold: u32,
    pub reset_timeout: Duration,
    pub last_failure: Option<Instant>,
    pub last_success: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            state: CircuitState::Closed,
            failure_count: 0,
            threshold,
            reset_timeout,
            last_failure: None,
            last_success: None,
        }
    }

    /// threshold=5, reset_timeout=60s.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, 5, Duration::from_secs(60))
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure = Some(Instant::now());
        if self.failure_count >= self.threshold {
            self.state = CircuitState::Open;
            warn!("circuit breaker '{}' opened after {} failures", self.name, self.failure_count);
        }
    }

    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.last_success = Some(Instant::now());
        self.state = CircuitState::Closed;
    }

    /// Returns whether a call should proceed, transitioning OPEN -> HALF_OPEN
    /// once `reset_timeout` has elapsed since the last failure.
    pub fn can_execute(&mut self) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open => match self.last_failure {
                Some(last_failure) if last_failure.elapsed() >= self.reset_timeout => {
                    self.state = CircuitState::HalfOpen;
                    debug!("circuit breaker '{}' entering half-open state", self.name);
                    true
                }
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let mut b = CircuitBreaker::new("test", 3, Duration::from_secs(1));
        assert!(b.can_execute());
        assert_eq!(b.state, CircuitState::Closed);

        b.record_failure();
        b.record_failure();
        assert_eq!(b.state, CircuitState::Closed);

        b.record_failure();
        assert_eq!(b.state, CircuitState::Open);
        assert!(!b.can_execute());
    }

    #[test]
    fn half_open_closes_on_success_and_reopens_on_failure() {
        let mut b = CircuitBreaker::new("test", 1, Duration::from_millis(10));
        b.record_failure();
        assert_eq!(b.state, CircuitState::Open);

        std::thread::sleep(Duration::from_millis(15));
        assert!(b.can_execute());
        assert_eq!(b.state, CircuitState::HalfOpen);

        b.record_success();
        assert_eq!(b.state, CircuitState::Closed);
        assert_eq!(b.failure_count, 0);
    }

    #[test]
    fn half_open_reopens_on_failure() {
        let mut b = CircuitBreaker::new("test", 1, Duration::from_millis(10));
        b.record_failure();
        std::thread::sleep(Duration::from_millis(15));
        assert!(b.can_execute());
        b.record_failure();
        assert_eq!(b.state, CircuitState::Open);
    }
}
