//! Domain model for the orchestrator.
//!
//! # Data Flow
//! ```text
//! Inbound body
//!     → request.rs (TransactionRequest, validated before use)
//!     → user.rs / gateway.rs (read-only reference data)
//!     → transaction.rs (Transaction record + status state machine)
//! ```
//!
//! # Design Decisions
//! - Identifiers are newtypes so a user id cannot be passed as a country id
//! - Amounts are `Decimal`, never floats
//! - Status transitions are encoded on the type, not in callers

pub mod gateway;
pub mod ids;
pub mod request;
pub mod transaction;
pub mod user;

pub use gateway::{BackendKind, Gateway, GatewayStatus, PayloadFormat, UnsupportedFormat};
pub use ids::{CountryId, GatewayId, TransactionId, UserId};
pub use request::TransactionRequest;
pub use transaction::{NewTransaction, Transaction, TransactionStatus, TransactionType};
pub use user::{Country, User};
