//! Component wiring.
//!
//! Builds every subsystem from an `OrchestratorConfig`: stores seeded from the
//! fixture tables, the backend registry, the selector, the event publisher with
//! its breaker, and the orchestrator itself.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::{OrchestratorConfig, SinkKind};
use crate::domain::{Country, Gateway, User};
use crate::events::{EventPublisher, EventSink, HttpSink, LogSink, TopicTable};
use crate::gateway::{BackendRegistry, GatewaySelector};
use crate::health::{CachedHealthProbe, HealthRegistry};
use crate::http::AppState;
use crate::orchestrator::TransactionOrchestrator;
use crate::resilience::{CircuitBreaker, CircuitBreakerSettings, RetryPolicy};
use crate::store::{
    GatewayStore, InMemoryCountryStore, InMemoryGatewayStore, InMemoryTransactionStore,
    InMemoryUserStore,
};

pub struct Components {
    pub state: AppState,
    pub gateways: Arc<dyn GatewayStore>,
    pub health: HealthRegistry,
    pub cancel: CancellationToken,
}

impl Components {
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let client = reqwest::Client::new();

        let countries = InMemoryCountryStore::with_countries(config.countries.iter().map(Country::from));
        let users = InMemoryUserStore::with_users(config.users.iter().map(User::from));
        let gateway_list: Vec<Gateway> = config.gateways.iter().map(Gateway::from).collect();
        let backends = BackendRegistry::from_gateways(&gateway_list, client.clone());
        let gateways: Arc<dyn GatewayStore> = Arc::new(InMemoryGatewayStore::with_gateways(gateway_list));
        let transactions = InMemoryTransactionStore::new();

        let health = HealthRegistry::new(&config.health_check);
        let selector = GatewaySelector::new(gateways.clone(), backends)
            .with_probe(Arc::new(CachedHealthProbe::new(health.clone())))
            .with_passive_health(health.clone())
            .with_backend_timeout(Duration::from_millis(config.timeouts.backend_ms));

        let sink: Arc<dyn EventSink> = match (config.events.sink, config.events.sink_url.as_deref()) {
            (SinkKind::Http, Some(url)) => Arc::new(HttpSink::new(url, client)),
            (SinkKind::Http, None) => {
                tracing::warn!("HTTP event sink has no URL, logging events instead");
                Arc::new(LogSink)
            }
            (SinkKind::Log, _) => Arc::new(LogSink),
        };
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerSettings::from_config(
            "event-publisher",
            &config.circuit_breaker,
        )));
        let publisher = EventPublisher::new(sink, breaker, TopicTable::from(&config.events))
            .with_send_timeout(Duration::from_millis(config.timeouts.publish_ms));

        let cancel = CancellationToken::new();
        let orchestrator = TransactionOrchestrator::new(
            Arc::new(users),
            Arc::new(transactions),
            Arc::new(selector),
            Arc::new(publisher),
        )
        .with_retry_policy(RetryPolicy::from(&config.retries))
        .with_cancellation(cancel.clone());

        tracing::info!(
            countries = config.countries.len(),
            users = config.users.len(),
            gateways = config.gateways.len(),
            "Stores seeded"
        );

        Self {
            state: AppState {
                orchestrator: Arc::new(orchestrator),
                gateways: gateways.clone(),
                countries: Arc::new(countries),
                health: health.clone(),
            },
            gateways,
            health,
            cancel,
        }
    }
}
