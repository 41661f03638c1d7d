//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each HTTP gateway
//!     → Update state.rs
//!
//! Passive health checks (gateway::selector):
//!     Backend submit outcome observed
//!     → Update state.rs
//!
//! Selection (probe.rs):
//!     Gateway selector asks the probe
//!     → probe reads state.rs (or always answers healthy)
//! ```
//!
//! # Design Decisions
//! - State transitions require consecutive successes/failures
//! - Health state is per-gateway

pub mod active;
pub mod probe;
pub mod state;

pub use probe::{AlwaysHealthy, CachedHealthProbe, HealthProbe};
pub use state::{GatewayHealth, HealthRegistry, HealthState};
