//! Circuit breaker for resilient model-port calls (§4.11).
//!
//! `CLOSED`: calls pass through, consecutive failures are counted.
//! `OPEN`: calls are rejected until `timeout_seconds` have elapsed.
//! `HALF_OPEN`: up to `half_open_max_calls` calls are admitted; a success
//! closes the circuit, a failure re-opens it.

use std::time::{Duration, Instant};

use rexlit_common::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    timeout: Duration,
    half_open_max_calls: u32,
    current_failures: u32,
    state: CircuitState,
    last_failure_at: Option<Instant>,
    half_open_calls: u32,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        CircuitBreaker::new(5, Duration::from_secs_f64(60.0), 1)
    }
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout: Duration, half_open_max_calls: u32) -> Self {
        CircuitBreaker {
            failure_threshold,
            timeout,
            half_open_max_calls,
            current_failures: 0,
            state: CircuitState::Closed,
            last_failure_at: None,
            half_open_calls: 0,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Run `f` under circuit-breaker protection. Rejects immediately with
    /// `CircuitBreakerOpen` while the circuit is open and the timeout
    /// hasn't elapsed; otherwise runs `f` and updates state from the
    /// outcome.
    pub fn call<T>(&mut self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.state == CircuitState::Open {
            if self.should_attempt_reset() {
                self.state = CircuitState::HalfOpen;
                self.half_open_calls = 0;
            } else {
                return Err(Error::CircuitBreakerOpen {
                    failures: self.current_failures,
                    timeout_seconds: self.timeout.as_secs_f64(),
                });
            }
        }

        match f() {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(e) => {
                self.on_failure();
                Err(e)
            }
        }
    }

    fn on_success(&mut self) {
        match self.state {
            CircuitState::HalfOpen => {
                self.half_open_calls += 1;
                if self.half_open_calls >= self.half_open_max_calls {
                    self.state = CircuitState::Closed;
                    self.current_failures = 0;
                    self.last_failure_at = None;
                }
            }
            CircuitState::Closed => {
                self.current_failures = 0;
                self.last_failure_at = None;
            }
            CircuitState::Open => {}
        }
    }

    fn on_failure(&mut self) {
        self.current_failures += 1;
        self.last_failure_at = Some(Instant::now());
        if self.current_failures >= self.failure_threshold {
            self.state = CircuitState::Open;
        }
    }

    fn should_attempt_reset(&self) -> bool {
        match self.last_failure_at {
            None => true,
            Some(at) => at.elapsed() >= self.timeout,
        }
    }

    pub fn reset(&mut self) {
        self.state = CircuitState::Closed;
        self.current_failures = 0;
        self.last_failure_at = None;
        self.half_open_calls = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_consecutive_failures() {
        let mut breaker = CircuitBreaker::new(3, Duration::from_secs(60), 1);
        for _ in 0..3 {
            let _ = breaker.call(|| Err::<(), _>(Error::Timeout { seconds: 1 }));
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        let err = breaker.call(|| Ok(())).unwrap_err();
        assert!(matches!(err, Error::CircuitBreakerOpen { .. }));
    }

    #[test]
    fn half_open_success_closes_circuit() {
        let mut breaker = CircuitBreaker::new(1, Duration::from_millis(0), 1);
        let _ = breaker.call(|| Err::<(), _>(Error::Timeout { seconds: 1 }));
        assert_eq!(breaker.state(), CircuitState::Open);

        let result = breaker.call(|| Ok(42));
        assert_eq!(result.unwrap(), 42);
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_failure_reopens_circuit() {
        let mut breaker = CircuitBreaker::new(1, Duration::from_millis(0), 1);
        let _ = breaker.call(|| Err::<(), _>(Error::Timeout { seconds: 1 }));
        let _ = breaker.call(|| Err::<(), _>(Error::Timeout { seconds: 1 }));
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn success_in_closed_state_resets_failure_count() {
        let mut breaker = CircuitBreaker::new(3, Duration::from_secs(60), 1);
        let _ = breaker.call(|| Err::<(), _>(Error::Timeout { seconds: 1 }));
        let _ = breaker.call(|| Ok(()));
        let _ = breaker.call(|| Err::<(), _>(Error::Timeout { seconds: 1 }));
        let _ = breaker.call(|| Err::<(), _>(Error::Timeout { seconds: 1 }));
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
