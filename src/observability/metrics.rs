//! Metrics collection and exposition.
//!
//! # Metrics
//! - `orchestrator_transactions_total` (counter): outcomes by type and outcome
//! - `orchestrator_backend_attempts_total` (counter): submit attempts by gateway and result
//! - `orchestrator_publish_total` (counter): event publications by outcome
//! - `orchestrator_circuit_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `orchestrator_gateway_health` (gauge): 1=healthy, 0=unhealthy
//!
//! Recording is a no-op until a recorder is installed with `init_metrics`.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the final outcome of a deposit/withdrawal.
pub fn record_transaction(kind: &'static str, outcome: &'static str) {
    metrics::counter!("orchestrator_transactions_total", "type" => kind, "outcome" => outcome)
        .increment(1);
}

/// Record one backend submit attempt.
pub fn record_backend_attempt(gateway: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!(
        "orchestrator_backend_attempts_total",
        "gateway" => gateway.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Record one publish outcome.
pub fn record_publish(outcome: &'static str) {
    metrics::counter!("orchestrator_publish_total", "outcome" => outcome).increment(1);
}

/// Record a circuit breaker state change.
pub fn record_circuit_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("orchestrator_circuit_state", "breaker" => breaker.to_string()).set(value);
}

/// Record gateway health.
pub fn record_gateway_health(gateway: &str, healthy: bool) {
    metrics::gauge!("orchestrator_gateway_health", "gateway" => gateway.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
