//! Health-aware gateway selection and backend invocation.
//!
//! # Responsibilities
//! - Rank active gateways for a country by ascending priority
//! - Return the first candidate that passes the health probe
//! - Submit a transaction to the backend of its gateway under a deadline
//! - Feed settled submit outcomes back into gateway health (passive checks)
//!
//! # Design Decisions
//! - The probe is pluggable and synchronous; selection never awaits network I/O
//!   beyond the store read
//! - A store read failure is reported the same way as an empty candidate list
//! - Only transient backend failures count against gateway health, and a
//!   retried submit counts once

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{CountryId, Gateway, GatewayId, Transaction, TransactionType};
use crate::gateway::backend::{BackendError, BackendRegistry};
use crate::health::{AlwaysHealthy, HealthProbe, HealthRegistry};
use crate::observability::metrics;
use crate::resilience::with_deadline;
use crate::store::GatewayStore;

/// Routing failures. Neither is retried by the orchestrator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no active gateway available for country {0}")]
    NoGatewayAvailable(CountryId),

    #[error("all {candidates} gateways for country {country} are unhealthy")]
    GatewaysUnhealthy { country: CountryId, candidates: usize },
}

pub struct GatewaySelector {
    gateways: Arc<dyn GatewayStore>,
    backends: BackendRegistry,
    probe: Arc<dyn HealthProbe>,
    passive_health: Option<HealthRegistry>,
    backend_timeout: Duration,
}

impl GatewaySelector {
    pub fn new(gateways: Arc<dyn GatewayStore>, backends: BackendRegistry) -> Self {
        Self {
            gateways,
            backends,
            probe: Arc::new(AlwaysHealthy),
            passive_health: None,
            backend_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Record submit outcomes into `registry`.
    pub fn with_passive_health(mut self, registry: HealthRegistry) -> Self {
        self.passive_health = Some(registry);
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Pick a gateway for `country`.
    ///
    /// `preferred` wins when it is one of the active, healthy candidates.
    pub async fn select_gateway(
        &self,
        country: CountryId,
        preferred: Option<GatewayId>,
    ) -> Result<Gateway, SelectionError> {
        let candidates = match self.gateways.active_for_country(country).await {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::error!(country = %country, error = %e, "Failed to fetch gateways");
                return Err(SelectionError::NoGatewayAvailable(country));
            }
        };

        if candidates.is_empty() {
            tracing::warn!(country = %country, "No active gateways for country");
            return Err(SelectionError::NoGatewayAvailable(country));
        }

        if let Some(id) = preferred {
            match candidates.iter().find(|g| g.id == id) {
                Some(gateway) if self.probe.is_healthy(gateway) => {
                    tracing::debug!(gateway = %gateway.name, "Using preferred gateway");
                    return Ok(gateway.clone());
                }
                Some(gateway) => {
                    tracing::warn!(gateway = %gateway.name, "Preferred gateway unhealthy, falling back to priority order");
                }
                None => {
                    tracing::debug!(gateway_id = %id, country = %country, "Preferred gateway not eligible for country");
                }
            }
        }

        let total = candidates.len();
        for gateway in candidates {
            if self.probe.is_healthy(&gateway) {
                tracing::debug!(gateway = %gateway.name, priority = gateway.priority, "Selected gateway");
                return Ok(gateway);
            }
            tracing::warn!(gateway = %gateway.name, "Gateway failed health probe, trying next");
        }

        Err(SelectionError::GatewaysUnhealthy {
            country,
            candidates: total,
        })
    }

    /// Submit `tx` to the backend of `tx.gateway_id`.
    pub async fn submit(&self, tx: &Transaction, kind: TransactionType) -> Result<(), BackendError> {
        let gateway = tx.gateway_id;
        let backend = self.backends.get(gateway).ok_or_else(|| {
            BackendError::Rejected(format!("no backend registered for gateway {}", gateway))
        })?;

        let result = with_deadline(self.backend_timeout, backend.submit(tx, kind))
            .await
            .unwrap_or_else(|elapsed| Err(BackendError::Timeout(elapsed.0)));

        metrics::record_backend_attempt(&gateway.to_string(), result.is_ok());
        result
    }

    /// Feed the settled outcome of a (possibly retried) submit into gateway health.
    ///
    /// Called once per transaction, not per attempt. Permanent rejections say
    /// nothing about gateway health and are ignored.
    pub fn record_outcome(&self, gateway: GatewayId, outcome: Result<(), &BackendError>) {
        let Some(registry) = &self.passive_health else {
            return;
        };
        let label = gateway.to_string();
        match outcome {
            Ok(()) => registry.record_success(gateway, &label),
            Err(e) if e.is_transient() => registry.record_failure(gateway, &label),
            Err(_) => {}
        }
    }
}
