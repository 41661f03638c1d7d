//! Event sinks.
//!
//! # Responsibilities
//! - Deliver one keyed message to a topic
//!
//! # Variants
//! - `LogSink`: logs topic, key and size per message, never the payload
//! - `HttpSink`: POSTs to `{base_url}/topics/{topic}` with an `X-Message-Key` header
//! - `MemorySink`: keeps messages in memory, can be told to fail

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    #[error("event sink unavailable: {0}")]
    Unavailable(String),

    #[error("event send timed out after {0:?}")]
    Timeout(Duration),

    #[error("event rejected by sink: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), SinkError> {
        tracing::info!(topic = %topic, key = %key, bytes = payload.len(), "Event published");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HttpSink {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSink {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl EventSink for HttpSink {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), SinkError> {
        let url = format!("{}/topics/{}", self.base_url, topic);
        let response = self
            .client
            .post(&url)
            .header("X-Message-Key", key)
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.is_server_error() {
            Err(SinkError::Unavailable(status.to_string()))
        } else {
            Err(SinkError::Rejected(status.to_string()))
        }
    }
}

/// A message captured by `MemorySink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub topic: String,
    pub key: String,
    pub payload: Vec<u8>,
}

/// Captures messages in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every send fails with `SinkError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("memory sink set to fail".into()));
        }
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                topic: topic.to_string(),
                key: key.to_string(),
                payload: payload.to_vec(),
            });
        Ok(())
    }
}
