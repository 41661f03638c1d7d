//! Payment transaction orchestrator library.

pub mod app;
pub mod config;
pub mod domain;
pub mod events;
pub mod gateway;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod resilience;
pub mod store;

pub use app::Components;
pub use config::OrchestratorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use orchestrator::{OrchestratorError, TransactionOrchestrator};
