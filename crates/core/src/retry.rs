//! Retry policy and circuit breaker
//!
//! The pieces the HTTP client leans on to survive a flaky upstream:
//! - [`RetryConfig`]: bounded attempts with exponential backoff
//! - [`CircuitBreaker`]: per-client failure tracking that fails fast while
//!   the upstream is down and probes recovery after a cooldown
//!
//! Time is read through the [`Clock`] trait so tests can walk the breaker
//! through its cooldown window without sleeping.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles each attempt after
    #[serde(with = "duration_secs")]
    pub backoff_base: Duration,
    /// Upper bound on any single delay
    #[serde(with = "duration_secs")]
    pub max_delay: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Config for fast-feedback contexts (short delays, same attempt count)
    #[must_use]
    pub fn quick() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(50),
            max_delay: Duration::from_millis(500),
        }
    }

    /// Single attempt, no backoff
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_base: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay to sleep after the given 1-indexed attempt fails.
    ///
    /// Attempt `n` waits `backoff_base * 2^(n-1)`, capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = self.backoff_base.as_secs_f64() * 2f64.powi(attempt as i32 - 1);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }
}

/// Time source for the circuit breaker
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall-clock time, used outside tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls permitted; failures counted
    Closed,
    /// Calls rejected until the cooldown elapses
    Open,
    /// One trial call permitted to probe recovery
    HalfOpen,
}

impl CircuitState {
    /// Lowercase wire representation
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// Time the circuit stays open after the last failure
    #[serde(with = "duration_secs")]
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker for preventing cascading failures
///
/// State, counter, and timestamp live under one mutex: availability checks
/// and transition decisions are check-then-act sequences, and concurrent
/// requests must observe them atomically.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a breaker on the system clock
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a breaker with an injected clock
    #[must_use]
    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Current consecutive-failure count
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    /// Whether a call may proceed.
    ///
    /// While open, checks the cooldown against the last failure; once it has
    /// elapsed the breaker moves to half-open and permits the next call.
    #[must_use]
    pub fn is_available(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = inner
                    .last_failure
                    .is_some_and(|at| self.clock.now().duration_since(at) >= self.config.cooldown);
                if cooled_down {
                    inner.state = CircuitState::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call.
    ///
    /// Resets the consecutive-failure counter; a half-open trial success
    /// closes the circuit.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        inner.failure_count = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
        }
    }

    /// Record a failed call.
    ///
    /// Opens the circuit at the failure threshold while closed; a half-open
    /// trial failure reopens it and restarts the cooldown window.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.failure_count += 1;
        inner.last_failure = Some(self.clock.now());
        match inner.state {
            CircuitState::Closed => {
                if inner.failure_count >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
            }
            CircuitState::Open => {}
        }
    }

    /// Restore the closed state and clear the counter
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.last_failure = None;
    }
}
