//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → OrchestratorConfig (validated, immutable)
//!     → fixtures seed the in-memory stores at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CircuitBreakerConfig, CountryConfig, EventsConfig, GatewayConfig, HealthCheckConfig,
    ListenerConfig, ObservabilityConfig, OrchestratorConfig, RetryConfig, SinkKind, TimeoutConfig,
    UserConfig,
};
