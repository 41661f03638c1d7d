//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through, failures counted
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: a limited number of trial calls probe recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures reach failure_threshold
//! Open → Half-Open: after cooldown elapses
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails
//! ```
//!
//! # Design Decisions
//! - One breaker instance is injected and shared via `Arc`; there is no global
//! - All state lives behind a single mutex, never held across an await
//! - Outcomes are tagged with a generation so a call that started before a
//!   transition cannot flip the new state
//! - An abandoned trial call releases its half-open slot on drop

use serde::Serialize;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Tuning for a breaker instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerSettings {
    pub name: String,
    /// Consecutive failures that trip the breaker.
    pub failure_threshold: u32,
    /// Time spent Open before trial calls are allowed.
    pub cooldown: Duration,
    /// Concurrent trial calls allowed while Half-Open.
    pub half_open_max_requests: u32,
    /// In Closed state, failure counts are cleared every interval.
    pub reset_interval: Option<Duration>,
}

impl CircuitBreakerSettings {
    pub fn from_config(name: impl Into<String>, config: &CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            failure_threshold: config.failure_threshold,
            cooldown: Duration::from_millis(config.cooldown_ms),
            half_open_max_requests: config.half_open_max_requests,
            reset_interval: (config.reset_interval_ms > 0)
                .then(|| Duration::from_millis(config.reset_interval_ms)),
        }
    }
}

/// Outcome of a call through the breaker.
#[derive(Debug, Error)]
pub enum CircuitError<E> {
    /// Rejected without attempting the call.
    #[error("circuit breaker '{name}' is open")]
    Open { name: String },

    /// The call ran and failed.
    #[error(transparent)]
    Inner(E),
}

/// Point-in-time view of a breaker, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub total_successes: u64,
    pub total_failures: u64,
    pub rejected: u64,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    generation: u64,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    window_started: Instant,
    half_open_in_flight: u32,
    total_successes: u64,
    total_failures: u64,
    rejected: u64,
}

/// A thread-safe circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    settings: CircuitBreakerSettings,
    inner: Mutex<Inner>,
}

/// Admission ticket for one call.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release(self.generation);
        }
    }
}

impl CircuitBreaker {
    pub fn new(settings: CircuitBreakerSettings) -> Self {
        let breaker = Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                generation: 0,
                consecutive_failures: 0,
                opened_at: None,
                window_started: Instant::now(),
                half_open_in_flight: 0,
                total_successes: 0,
                total_failures: 0,
                rejected: 0,
            }),
            settings,
        };
        metrics::record_circuit_state(&breaker.settings.name, CircuitState::Closed);
        breaker
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Current state, applying a pending Open → Half-Open transition.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.refresh(&mut inner, Instant::now());
        inner.state
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let mut inner = self.lock();
        self.refresh(&mut inner, Instant::now());
        CircuitSnapshot {
            name: self.settings.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            total_successes: inner.total_successes,
            total_failures: inner.total_failures,
            rejected: inner.rejected,
        }
    }

    /// Run `fut` through the breaker.
    ///
    /// While Open the future is dropped unpolled and `CircuitError::Open` is returned.
    pub async fn call<F, T, E>(&self, fut: F) -> Result<T, CircuitError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let mut permit = self.acquire().ok_or_else(|| CircuitError::Open {
            name: self.settings.name.clone(),
        })?;

        let result = fut.await;
        permit.settled = true;
        match result {
            Ok(value) => {
                self.on_success(permit.generation);
                Ok(value)
            }
            Err(err) => {
                self.on_failure(permit.generation);
                Err(CircuitError::Inner(err))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();
        let now = Instant::now();
        self.refresh(&mut inner, now);

        match inner.state {
            CircuitState::Closed => {}
            CircuitState::Open => {
                inner.rejected += 1;
                return None;
            }
            CircuitState::HalfOpen => {
                if inner.half_open_in_flight >= self.settings.half_open_max_requests.max(1) {
                    inner.rejected += 1;
                    return None;
                }
                inner.half_open_in_flight += 1;
            }
        }

        Some(Permit {
            breaker: self,
            generation: inner.generation,
            settled: false,
        })
    }

    /// Time-driven transitions: cooldown expiry and closed-window reset.
    fn refresh(&self, inner: &mut Inner, now: Instant) {
        match inner.state {
            CircuitState::Open => {
                let cooled = inner
                    .opened_at
                    .is_some_and(|at| now.duration_since(at) >= self.settings.cooldown);
                if cooled {
                    self.transition(inner, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::Closed => {
                if let Some(interval) = self.settings.reset_interval {
                    if now.duration_since(inner.window_started) >= interval {
                        inner.consecutive_failures = 0;
                        inner.window_started = now;
                    }
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    fn on_success(&self, generation: u64) {
        let mut inner = self.lock();
        inner.total_successes += 1;
        if generation != inner.generation {
            return;
        }
        match inner.state {
            CircuitState::Closed => inner.consecutive_failures = 0,
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Closed, Instant::now()),
            CircuitState::Open => {}
        }
    }

    fn on_failure(&self, generation: u64) {
        let mut inner = self.lock();
        inner.total_failures += 1;
        if generation != inner.generation {
            return;
        }
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.settings.failure_threshold.max(1) {
                    self.transition(&mut inner, CircuitState::Open, Instant::now());
                }
            }
            CircuitState::HalfOpen => self.transition(&mut inner, CircuitState::Open, Instant::now()),
            CircuitState::Open => {}
        }
    }

    fn release(&self, generation: u64) {
        let mut inner = self.lock();
        if generation == inner.generation && inner.state == CircuitState::HalfOpen {
            inner.half_open_in_flight = inner.half_open_in_flight.saturating_sub(1);
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState, now: Instant) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.half_open_in_flight = 0;
        inner.window_started = now;
        match to {
            CircuitState::Open => inner.opened_at = Some(now),
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
                inner.opened_at = None;
            }
            CircuitState::HalfOpen => {}
        }

        if to == CircuitState::Open {
            tracing::warn!(
                breaker = %self.settings.name,
                from = from.as_str(),
                consecutive_failures = inner.consecutive_failures,
                cooldown = ?self.settings.cooldown,
                "Circuit breaker opened"
            );
        } else {
            tracing::info!(
                breaker = %self.settings.name,
                from = from.as_str(),
                to = to.as_str(),
                "Circuit breaker state changed"
            );
        }
        metrics::record_circuit_state(&self.settings.name, to);
    }
}
