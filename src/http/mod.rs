//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → negotiate.rs (Accept → response format)
//!     → handlers.rs (decode JSON/XML, call the orchestrator)
//!     → response.rs (envelope, error → status code)
//!     → negotiate.rs (re-encode as XML when asked)
//!     → Send to client
//! ```

pub mod handlers;
pub mod negotiate;
pub mod request;
pub mod response;
pub mod server;

pub use negotiate::{negotiate_response, RequestBody};
pub use request::{RequestId, X_REQUEST_ID};
pub use response::{ApiResponse, TransactionSummary};
pub use server::{AppState, HttpServer};
