//! Gateway subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator
//!     → selector.rs (active candidates for country, priority order)
//!     → health probe (first healthy candidate wins)
//!     → backend.rs (submit to the chosen gateway's backend)
//!     → health registry (passive outcome)
//! ```

pub mod backend;
pub mod selector;

pub use backend::{BackendError, BackendRegistry, HttpBackend, PaymentBackend, SimulatedBackend};
pub use selector::{GatewaySelector, SelectionError};
