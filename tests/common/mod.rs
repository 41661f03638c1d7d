//! Shared fakes and builders for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

use payment_orchestrator::domain::{
    BackendKind, CountryId, Gateway, GatewayId, GatewayStatus, NewTransaction, PayloadFormat,
    Transaction, TransactionId, TransactionStatus, TransactionType, User, UserId,
};
use payment_orchestrator::events::{EventPublisher, EventSink, SinkError, TopicTable};
use payment_orchestrator::gateway::{BackendError, BackendRegistry, GatewaySelector, PaymentBackend};
use payment_orchestrator::health::{CachedHealthProbe, HealthRegistry};
use payment_orchestrator::resilience::{CircuitBreaker, CircuitBreakerSettings, RetryPolicy};
use payment_orchestrator::store::{
    GatewayStore, InMemoryGatewayStore, InMemoryTransactionStore, InMemoryUserStore, StoreError,
    StoreResult, TransactionStore,
};
use payment_orchestrator::TransactionOrchestrator;

pub fn user(id: i64, country: i64) -> User {
    User {
        id: UserId(id),
        username: format!("user-{}", id),
        email: format!("user-{}@example.com", id),
        country_id: CountryId(country),
    }
}

pub fn gateway(id: i64, priority: u32, countries: &[i64]) -> Gateway {
    Gateway {
        id: GatewayId(id),
        name: format!("gw-{}", id),
        data_format: PayloadFormat::Json,
        priority,
        status: GatewayStatus::Active,
        countries: countries.iter().copied().map(CountryId).collect(),
        kind: BackendKind::Simulated,
        endpoint: None,
    }
}

/// Backend that replays a script of outcomes, then succeeds.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<(), BackendError>>>,
    calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn new(script: impl IntoIterator<Item = Result<(), BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn always_failing(error: BackendError) -> Arc<Self> {
        Self::new(std::iter::repeat(Err(error)).take(64))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentBackend for ScriptedBackend {
    async fn submit(&self, _tx: &Transaction, _kind: TransactionType) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// Backend that parks every call until released.
#[derive(Default)]
pub struct GatedBackend {
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl PaymentBackend for GatedBackend {
    async fn submit(&self, _tx: &Transaction, _kind: TransactionType) -> Result<(), BackendError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }
}

/// Sink that counts every send attempt, including failed ones.
#[derive(Default)]
pub struct CountingSink {
    attempts: AtomicU32,
    failing: AtomicBool,
    sent: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl CountingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, String, Vec<u8>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for CountingSink {
    async fn send(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("injected".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_string(), key.to_string(), payload.to_vec()));
        Ok(())
    }
}

/// Transaction store that records every write.
#[derive(Default)]
pub struct RecordingTransactionStore {
    inner: InMemoryTransactionStore,
    creates: AtomicU32,
    updates: Mutex<Vec<(TransactionId, TransactionStatus, TransactionStatus)>>,
    fail_updates: AtomicBool,
    fail_creates: AtomicBool,
}

impl RecordingTransactionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn creates(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> Vec<(TransactionId, TransactionStatus, TransactionStatus)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }

    pub fn fail_creates(&self) {
        self.fail_creates.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionStore for RecordingTransactionStore {
    async fn create(&self, tx: NewTransaction) -> StoreResult<Transaction> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected".into()));
        }
        self.inner.create(tx).await
    }

    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> StoreResult<Transaction> {
        self.updates.lock().unwrap().push((id, expected, status));
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected".into()));
        }
        self.inner.update_status(id, expected, status).await
    }

    async fn get(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        self.inner.get(id).await
    }

    async fn list(&self) -> StoreResult<Vec<Transaction>> {
        self.inner.list().await
    }
}

/// Gateway store whose reads always fail.
pub struct BrokenGatewayStore;

#[async_trait]
impl GatewayStore for BrokenGatewayStore {
    async fn active_for_country(&self, _country: CountryId) -> StoreResult<Vec<Gateway>> {
        Err(StoreError::Unavailable("injected".into()))
    }

    async fn all_gateways(&self) -> StoreResult<Vec<Gateway>> {
        Err(StoreError::Unavailable("injected".into()))
    }
}

/// Fully wired orchestrator over fakes.
pub struct Harness {
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub transactions: Arc<RecordingTransactionStore>,
    pub sink: Arc<CountingSink>,
    pub health: HealthRegistry,
    pub breaker: Arc<CircuitBreaker>,
}

pub struct HarnessBuilder {
    users: Vec<User>,
    gateways: Option<Arc<dyn GatewayStore>>,
    gateway_list: Vec<Gateway>,
    backends: BackendRegistry,
    retry: RetryPolicy,
    failure_threshold: u32,
    cooldown: Duration,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            users: vec![user(1, 1)],
            gateways: None,
            gateway_list: Vec::new(),
            backends: BackendRegistry::new(),
            retry: RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(80)),
            failure_threshold: 4,
            cooldown: Duration::from_secs(3),
        }
    }
}

impl HarnessBuilder {
    pub fn gateway(mut self, gateway: Gateway, backend: Arc<dyn PaymentBackend>) -> Self {
        self.backends.register(gateway.id, backend);
        self.gateway_list.push(gateway);
        self
    }

    pub fn gateway_store(mut self, store: Arc<dyn GatewayStore>) -> Self {
        self.gateways = Some(store);
        self
    }

    pub fn user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts;
        self
    }

    pub fn breaker(mut self, failure_threshold: u32, cooldown: Duration) -> Self {
        self.failure_threshold = failure_threshold;
        self.cooldown = cooldown;
        self
    }

    pub fn build(self) -> Harness {
        let gateways = self
            .gateways
            .unwrap_or_else(|| Arc::new(InMemoryGatewayStore::with_gateways(self.gateway_list)));
        let health = HealthRegistry::default();
        let selector = GatewaySelector::new(gateways, self.backends)
            .with_probe(Arc::new(CachedHealthProbe::new(health.clone())))
            .with_passive_health(health.clone())
            .with_backend_timeout(Duration::from_secs(1));

        let sink = CountingSink::new();
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerSettings {
            name: "events".into(),
            failure_threshold: self.failure_threshold,
            cooldown: self.cooldown,
            half_open_max_requests: 1,
            reset_interval: None,
        }));
        let publisher = EventPublisher::new(sink.clone(), breaker.clone(), TopicTable::default());

        let transactions = RecordingTransactionStore::new();
        let orchestrator = TransactionOrchestrator::new(
            Arc::new(InMemoryUserStore::with_users(self.users)),
            transactions.clone(),
            Arc::new(selector),
            Arc::new(publisher),
        )
        .with_retry_policy(self.retry);

        Harness {
            orchestrator: Arc::new(orchestrator),
            transactions,
            sink,
            health,
            breaker,
        }
    }
}

async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + content_length {
            return;
        }
    }
}

/// Start a programmable HTTP server on an ephemeral port.
///
/// `f` receives the 0-based request number and returns `(status, body)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);
    let counter = Arc::new(AtomicU32::new(0));

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        read_request(&mut socket).await;
                        let (status, body) = f(n).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
