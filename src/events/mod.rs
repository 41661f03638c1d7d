//! Event publication subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator (backend succeeded)
//!     → publisher.rs (serialize + resolve topic via topics.rs)
//!     → circuit breaker (fail fast while the sink is down)
//!     → sink.rs (log, HTTP or memory)
//! ```
//!
//! # Design Decisions
//! - The breaker is injected, so each test can own an isolated instance
//! - Messages are keyed by `txn-{id}`

pub mod publisher;
pub mod sink;
pub mod topics;

pub use publisher::{EventPublisher, PublishError};
pub use sink::{EventSink, HttpSink, LogSink, MemorySink, SentMessage, SinkError};
pub use topics::TopicTable;
