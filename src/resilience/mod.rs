//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Backend submit:
//!     → retries.rs (bounded attempts, classify transient vs permanent)
//!     → backoff.rs (exponential delay between attempts)
//!     → timeouts.rs (deadline per attempt)
//!
//! Event publish:
//!     → circuit_breaker.rs (fail fast while the sink is down)
//!     → timeouts.rs (deadline per send)
//! ```
//!
//! # Design Decisions
//! - Every outbound call has a deadline
//! - Retries respect caller cancellation, including mid-backoff
//! - The circuit breaker is the only state shared across requests

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerSettings, CircuitError, CircuitSnapshot, CircuitState};
pub use retries::{RetryError, RetryPolicy};
pub use timeouts::{with_deadline, DeadlineElapsed};
