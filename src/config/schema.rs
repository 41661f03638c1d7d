//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the orchestrator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::domain::{
    BackendKind, Country, CountryId, Gateway, GatewayId, GatewayStatus, PayloadFormat, User, UserId,
};

/// Root configuration for the payment orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend submit retry settings.
    pub retries: RetryConfig,

    /// Event publisher circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Gateway health check settings.
    pub health_check: HealthCheckConfig,

    /// Event sink and topic settings.
    pub events: EventsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Country fixtures.
    pub countries: Vec<CountryConfig>,

    /// User fixtures.
    pub users: Vec<UserConfig>,

    /// Gateway definitions.
    pub gateways: Vec<GatewayConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,

    /// Time the circuit stays open before a trial call, in milliseconds.
    pub cooldown_ms: u64,

    /// Concurrent trial calls allowed while half-open.
    pub half_open_max_requests: u32,

    /// Closed-state failure counts are cleared at this interval (0 = never).
    pub reset_interval_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 4,
            cooldown_ms: 3000,
            half_open_max_requests: 1,
            reset_interval_ms: 5000,
        }
    }
}

/// Timeout configuration for outbound calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single backend submit attempt, in milliseconds.
    pub backend_ms: u64,

    /// Deadline for a single event send, in milliseconds.
    pub publish_ms: u64,

    /// Inbound request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            backend_ms: 5000,
            publish_ms: 2000,
            request_secs: 30,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks of HTTP gateways.
    pub enabled: bool,

    /// Health check interval in seconds.
    pub interval_secs: u64,

    /// Health check timeout in seconds.
    pub timeout_secs: u64,

    /// Path to probe on the gateway endpoint.
    pub path: String,

    /// Number of consecutive failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Number of consecutive successes before marking healthy.
    pub healthy_threshold: u32,

    /// Seconds an unhealthy gateway waits before it is sent a trial request.
    pub recovery_cooldown_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_secs: 5,
            path: "/health".to_string(),
            unhealthy_threshold: 3,
            healthy_threshold: 2,
            recovery_cooldown_secs: 30,
        }
    }
}

/// Where transaction events are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Structured log line per event.
    #[default]
    Log,
    /// HTTP POST to an event gateway.
    Http,
}

/// Event publication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    pub sink: SinkKind,

    /// Base URL of the event gateway for `sink = "http"`.
    pub sink_url: Option<String>,

    /// Topic for JSON payloads.
    pub json_topic: String,

    /// Topic for XML payloads.
    pub xml_topic: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::Log,
            sink_url: None,
            json_topic: "transactions.json".to_string(),
            xml_topic: "transactions.xml".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Country fixture.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CountryConfig {
    pub id: i64,
    pub name: String,
    pub code: String,
}

impl From<&CountryConfig> for Country {
    fn from(c: &CountryConfig) -> Self {
        Country {
            id: CountryId(c.id),
            name: c.name.clone(),
            code: c.code.clone(),
        }
    }
}

/// User fixture.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub country_id: i64,
}

impl From<&UserConfig> for User {
    fn from(u: &UserConfig) -> Self {
        User {
            id: UserId(u.id),
            username: u.username.clone(),
            email: u.email.clone(),
            country_id: CountryId(u.country_id),
        }
    }
}

/// Gateway definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub id: i64,
    pub name: String,

    /// Lower is preferred.
    #[serde(default)]
    pub priority: u32,

    #[serde(default)]
    pub status: GatewayStatus,

    #[serde(default)]
    pub data_format: PayloadFormat,

    #[serde(default)]
    pub kind: BackendKind,

    /// Base URL, required for `kind = "http"`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Countries this gateway serves.
    #[serde(default)]
    pub countries: Vec<i64>,
}

impl From<&GatewayConfig> for Gateway {
    fn from(g: &GatewayConfig) -> Self {
        Gateway {
            id: GatewayId(g.id),
            name: g.name.clone(),
            data_format: g.data_format,
            priority: g.priority,
            status: g.status,
            countries: g.countries.iter().copied().map(CountryId).collect(),
            kind: g.kind,
            endpoint: g.endpoint.clone(),
        }
    }
}
