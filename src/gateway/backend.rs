//! Payment backend capability.
//!
//! # Responsibilities
//! - Submit a deposit or withdrawal to the payment network behind a gateway
//! - Classify failures as transient (worth retrying) or permanent
//! - Map each gateway to the backend variant that serves it
//!
//! # Design Decisions
//! - Backends are selected at runtime by `BackendKind`; no inheritance
//! - The transaction correlation key is sent as the idempotency key so a
//!   backend can dedupe retried submissions. A backend that ignores it may
//!   execute a retried submission twice

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{BackendKind, Gateway, GatewayId, Transaction, TransactionType};
use crate::observability::logging::mask;

/// Why a backend submission did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached or answered with a server error.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The submission did not complete within its deadline.
    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    /// The backend refused the submission. Retrying will not help.
    #[error("backend rejected submission: {0}")]
    Rejected(String),
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Unavailable(_) | BackendError::Timeout(_))
    }
}

/// Opaque capability standing in for a payment-network client.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn submit(&self, tx: &Transaction, kind: TransactionType) -> Result<(), BackendError>;
}

/// In-process backend that accepts every submission.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    gateway: String,
}

impl SimulatedBackend {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
        }
    }
}

#[async_trait]
impl PaymentBackend for SimulatedBackend {
    async fn submit(&self, tx: &Transaction, kind: TransactionType) -> Result<(), BackendError> {
        tracing::info!(
            gateway = %self.gateway,
            transaction_id = %tx.id,
            kind = %kind,
            amount = %mask(&tx.amount.to_string()),
            "Processing transaction"
        );
        Ok(())
    }
}

/// Remote backend reached over HTTP.
///
/// POSTs the transaction as JSON to `{endpoint}/deposit` or `{endpoint}/withdrawal`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, kind: TransactionType) -> String {
        format!("{}/{}", self.endpoint, kind.as_str())
    }
}

#[async_trait]
impl PaymentBackend for HttpBackend {
    async fn submit(&self, tx: &Transaction, kind: TransactionType) -> Result<(), BackendError> {
        let response = self
            .client
            .post(self.url(kind))
            .header("Idempotency-Key", tx.id.correlation_key())
            .json(tx)
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            Err(BackendError::Unavailable(format!("{}: {}", status, body)))
        } else {
            Err(BackendError::Rejected(format!("{}: {}", status, body)))
        }
    }
}

/// Maps each gateway to the backend that serves it.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: Arc<DashMap<GatewayId, Arc<dyn PaymentBackend>>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one backend per gateway from its `kind`.
    ///
    /// HTTP gateways without an endpoint fall back to the simulated backend.
    pub fn from_gateways<'a>(
        gateways: impl IntoIterator<Item = &'a Gateway>,
        client: reqwest::Client,
    ) -> Self {
        let registry = Self::new();
        for gateway in gateways {
            let backend: Arc<dyn PaymentBackend> = match (gateway.kind, gateway.endpoint.as_deref()) {
                (BackendKind::Http, Some(endpoint)) => {
                    Arc::new(HttpBackend::new(endpoint, client.clone()))
                }
                (BackendKind::Http, None) => {
                    tracing::warn!(gateway = %gateway.name, "HTTP gateway has no endpoint, using simulated backend");
                    Arc::new(SimulatedBackend::new(gateway.name.clone()))
                }
                (BackendKind::Simulated, _) => Arc::new(SimulatedBackend::new(gateway.name.clone())),
            };
            registry.register(gateway.id, backend);
        }
        registry
    }

    pub fn register(&self, gateway: GatewayId, backend: Arc<dyn PaymentBackend>) {
        self.backends.insert(gateway, backend);
    }

    pub fn get(&self, gateway: GatewayId) -> Option<Arc<dyn PaymentBackend>> {
        self.backends.get(&gateway).map(|b| b.value().clone())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
