//! Transaction orchestration.
//!
//! The only entry points for outer layers are `deposit`, `withdrawal` and
//! `reconcile` on `TransactionOrchestrator`. Every failure is an
//! `OrchestratorError` whose `kind()` is stable across releases.

pub mod error;
pub mod service;

pub use error::{ErrorKind, OrchestratorError};
pub use service::{validate, OrchestratorResult, TransactionOrchestrator};
