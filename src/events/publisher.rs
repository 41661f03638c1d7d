//! Transaction event publisher.
//!
//! # Responsibilities
//! - Resolve the topic from the payload format
//! - Send one message keyed by the transaction correlation key
//! - Fail fast through the circuit breaker while the sink is down
//!
//! # Design Decisions
//! - Unknown formats are rejected before the breaker is consulted, so they
//!   never count as sink failures
//! - A send that exceeds its deadline counts as a breaker failure

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::TransactionId;
use crate::events::sink::{EventSink, SinkError};
use crate::events::topics::{TopicTable, UnsupportedFormat};
use crate::observability::metrics;
use crate::resilience::{with_deadline, CircuitBreaker, CircuitError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),

    #[error("circuit breaker '{breaker}' is open, event not sent")]
    CircuitOpen { breaker: String },

    #[error("failed to publish event: {0}")]
    PublishFailed(#[source] SinkError),
}

pub struct EventPublisher {
    sink: Arc<dyn EventSink>,
    breaker: Arc<CircuitBreaker>,
    topics: TopicTable,
    send_timeout: Duration,
}

impl EventPublisher {
    pub fn new(sink: Arc<dyn EventSink>, breaker: Arc<CircuitBreaker>, topics: TopicTable) -> Self {
        Self {
            sink,
            breaker,
            topics,
            send_timeout: Duration::from_secs(2),
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Publish `payload` for `transaction_id` to the topic of `format`.
    ///
    /// `format` is a content type such as `application/json`.
    pub async fn publish(
        &self,
        transaction_id: TransactionId,
        payload: &[u8],
        format: &str,
    ) -> Result<(), PublishError> {
        let (_, topic) = self.topics.resolve(format).inspect_err(|e| {
            tracing::warn!(transaction_id = %transaction_id, error = %e, "Rejected event format");
            metrics::record_publish("unsupported_format");
        })?;
        let key = transaction_id.correlation_key();

        let send = async {
            with_deadline(self.send_timeout, self.sink.send(topic, &key, payload))
                .await
                .unwrap_or_else(|elapsed| Err(SinkError::Timeout(elapsed.0)))
        };

        match self.breaker.call(send).await {
            Ok(()) => {
                tracing::debug!(topic = %topic, key = %key, "Event delivered");
                metrics::record_publish("success");
                Ok(())
            }
            Err(CircuitError::Open { name }) => {
                tracing::warn!(transaction_id = %transaction_id, breaker = %name, "Circuit open, event not sent");
                metrics::record_publish("circuit_open");
                Err(PublishError::CircuitOpen { breaker: name })
            }
            Err(CircuitError::Inner(e)) => {
                tracing::error!(transaction_id = %transaction_id, topic = %topic, error = %e, "Event send failed");
                metrics::record_publish("failure");
                Err(PublishError::PublishFailed(e))
            }
        }
    }
}
