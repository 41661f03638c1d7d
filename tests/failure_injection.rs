//! Failure injection against real HTTP backends and sinks.

use rust_decimal_macros::dec;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use payment_orchestrator::config::HealthCheckConfig;
use payment_orchestrator::domain::{
    BackendKind, GatewayId, TransactionId, TransactionRequest, TransactionStatus, UserId,
};
use payment_orchestrator::events::{EventPublisher, HttpSink, PublishError, TopicTable};
use payment_orchestrator::gateway::HttpBackend;
use payment_orchestrator::health::active::HealthMonitor;
use payment_orchestrator::health::{HealthRegistry, HealthState};
use payment_orchestrator::lifecycle::Shutdown;
use payment_orchestrator::orchestrator::ErrorKind;
use payment_orchestrator::resilience::{CircuitBreaker, CircuitBreakerSettings, CircuitState};
use payment_orchestrator::store::{InMemoryGatewayStore, TransactionStore};

mod common;
use common::{gateway, start_programmable_backend, HarnessBuilder};

fn http_backend(addr: SocketAddr) -> Arc<HttpBackend> {
    Arc::new(HttpBackend::new(format!("http://{}", addr), reqwest::Client::new()))
}

fn request() -> TransactionRequest {
    TransactionRequest::new(dec!(42.50), UserId(1), "EUR")
}

#[tokio::test]
async fn test_retry_on_server_errors() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let addr = start_programmable_backend(move |n| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                (503, "Service Unavailable".into())
            } else {
                (200, "{}".into())
            }
        }
    })
    .await;

    let h = HarnessBuilder::default()
        .gateway(gateway(1, 1, &[1]), http_backend(addr))
        .max_attempts(3)
        .build();

    let tx = h.orchestrator.deposit(request()).await.unwrap();

    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(calls.load(Ordering::SeqCst), 3, "Should succeed on the third attempt");
    assert_eq!(h.sink.sent().len(), 1);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let calls = Arc::new(AtomicU32::new(0));
    let cc = calls.clone();
    let addr = start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (400, "insufficient funds".into())
        }
    })
    .await;

    let h = HarnessBuilder::default()
        .gateway(gateway(1, 1, &[1]), http_backend(addr))
        .max_attempts(5)
        .build();

    let err = h.orchestrator.withdrawal(request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BackendRejected);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let stored = h.transactions.list().await.unwrap();
    assert_eq!(stored[0].status, TransactionStatus::Failed);
}

#[tokio::test]
async fn test_backend_down_marks_failed_and_degrades_health() {
    let addr = start_programmable_backend(|_| async { (500, "boom".into()) }).await;

    let h = HarnessBuilder::default()
        .gateway(gateway(1, 1, &[1]), http_backend(addr))
        .max_attempts(3)
        .build();

    let err = h.orchestrator.deposit(request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendUnavailable);

    let stored = h.transactions.list().await.unwrap();
    assert_eq!(stored[0].status, TransactionStatus::Failed);
    assert_ne!(h.health.state(GatewayId(1)), HealthState::Unhealthy);

    // Three failed transactions cross the default unhealthy threshold.
    for _ in 0..2 {
        let err = h.orchestrator.deposit(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
    }
    assert_eq!(h.health.state(GatewayId(1)), HealthState::Unhealthy);
    let err = h.orchestrator.deposit(request()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GatewaysUnhealthy);
}

#[tokio::test]
async fn test_http_sink_failures_open_circuit() {
    let hits = Arc::new(AtomicU32::new(0));
    let hh = hits.clone();
    let addr = start_programmable_backend(move |_| {
        let hh = hh.clone();
        async move {
            hh.fetch_add(1, Ordering::SeqCst);
            (503, "down".into())
        }
    })
    .await;

    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerSettings {
        name: "events".into(),
        failure_threshold: 2,
        cooldown: Duration::from_secs(30),
        half_open_max_requests: 1,
        reset_interval: None,
    }));
    let sink = HttpSink::new(format!("http://{}", addr), reqwest::Client::new());
    let publisher = EventPublisher::new(Arc::new(sink), breaker.clone(), TopicTable::default());

    for _ in 0..2 {
        let err = publisher
            .publish(TransactionId(1), b"{}", "application/json")
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::PublishFailed(_)));
    }

    let err = publisher
        .publish(TransactionId(1), b"{}", "application/json")
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::CircuitOpen { .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn test_health_monitor_marks_unreachable_gateway() {
    let healthy = start_programmable_backend(|_| async { (200, "ok".into()) }).await;
    let broken = start_programmable_backend(|_| async { (503, "down".into()) }).await;

    let mut up = gateway(1, 1, &[1]);
    up.kind = BackendKind::Http;
    up.endpoint = Some(format!("http://{}", healthy));
    let mut down = gateway(2, 2, &[1]);
    down.kind = BackendKind::Http;
    down.endpoint = Some(format!("http://{}", broken));

    let config = HealthCheckConfig {
        interval_secs: 1,
        timeout_secs: 1,
        unhealthy_threshold: 2,
        healthy_threshold: 1,
        ..HealthCheckConfig::default()
    };
    let registry = HealthRegistry::new(&config);
    let store = Arc::new(InMemoryGatewayStore::with_gateways([up, down]));
    let monitor = HealthMonitor::new(store, registry.clone(), config);

    monitor.check_all().await;
    monitor.check_all().await;

    assert_eq!(registry.state(GatewayId(1)), HealthState::Healthy);
    assert_eq!(registry.state(GatewayId(2)), HealthState::Unhealthy);
}

#[tokio::test]
async fn test_health_monitor_stops_on_shutdown() {
    let store = Arc::new(InMemoryGatewayStore::new());
    let monitor = HealthMonitor::new(store, HealthRegistry::default(), HealthCheckConfig::default());
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(monitor.run(shutdown.subscribe()));

    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("monitor should exit after shutdown")
        .unwrap();
}
