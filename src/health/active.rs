//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe HTTP gateways at `{endpoint}{path}`
//! - Update gateway health state based on results

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::domain::{BackendKind, Gateway};
use crate::health::state::HealthRegistry;
use crate::observability::metrics;
use crate::store::GatewayStore;

pub struct HealthMonitor {
    gateways: Arc<dyn GatewayStore>,
    registry: HealthRegistry,
    config: HealthCheckConfig,
    client: reqwest::Client,
}

impl HealthMonitor {
    pub fn new(
        gateways: Arc<dyn GatewayStore>,
        registry: HealthRegistry,
        config: HealthCheckConfig,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            gateways,
            registry,
            config,
            client,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs.max(1)));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every HTTP gateway once.
    pub async fn check_all(&self) {
        let gateways = match self.gateways.all_gateways().await {
            Ok(gateways) => gateways,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list gateways for health check");
                return;
            }
        };

        for gateway in gateways.iter().filter(|g| g.kind == BackendKind::Http) {
            let healthy = self.check(gateway).await;
            if healthy {
                self.registry.record_success(gateway.id, &gateway.name);
            } else {
                self.registry.record_failure(gateway.id, &gateway.name);
            }

            metrics::record_gateway_health(&gateway.name, self.registry.is_healthy(gateway.id));
        }
    }

    async fn check(&self, gateway: &Gateway) -> bool {
        let Some(endpoint) = gateway.endpoint.as_deref() else {
            tracing::warn!(gateway = %gateway.name, "HTTP gateway has no endpoint to probe");
            return false;
        };
        let url = format!("{}{}", endpoint.trim_end_matches('/'), self.config.path);

        match self
            .client
            .get(&url)
            .header("user-agent", "payment-orchestrator-health-check")
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(gateway = %gateway.name, status = %response.status(), "Health check failed: non-success status");
                false
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(gateway = %gateway.name, "Health check failed: timeout");
                false
            }
            Err(e) => {
                tracing::warn!(gateway = %gateway.name, error = %e, "Health check failed: connection error");
                false
            }
        }
    }
}
