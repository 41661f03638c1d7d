//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (users and gateways reference known countries)
//! - Validate value ranges (attempts > 0, delays > 0, thresholds > 0)
//!
//! Returns all validation errors, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{OrchestratorConfig, SinkKind};
use crate::domain::BackendKind;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "must be a socket address"));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if config.retries.base_delay_ms == 0 {
        errors.push(ValidationError::new("retries.base_delay_ms", "must be greater than 0"));
    }
    if config.retries.max_delay_ms < config.retries.base_delay_ms {
        errors.push(ValidationError::new("retries.max_delay_ms", "must not be below base_delay_ms"));
    }

    if config.circuit_breaker.failure_threshold == 0 {
        errors.push(ValidationError::new("circuit_breaker.failure_threshold", "must be at least 1"));
    }
    if config.circuit_breaker.half_open_max_requests == 0 {
        errors.push(ValidationError::new("circuit_breaker.half_open_max_requests", "must be at least 1"));
    }

    if config.health_check.recovery_cooldown_secs == 0 {
        errors.push(ValidationError::new("health_check.recovery_cooldown_secs", "must be greater than 0"));
    }

    if config.timeouts.backend_ms == 0 || config.timeouts.publish_ms == 0 {
        errors.push(ValidationError::new("timeouts", "outbound deadlines must be greater than 0"));
    }

    if config.events.json_topic.is_empty() || config.events.xml_topic.is_empty() {
        errors.push(ValidationError::new("events", "topic names must not be empty"));
    }
    if config.events.sink == SinkKind::Http {
        match config.events.sink_url.as_deref().map(Url::parse) {
            Some(Ok(_)) => {}
            Some(Err(e)) => errors.push(ValidationError::new("events.sink_url", e.to_string())),
            None => errors.push(ValidationError::new("events.sink_url", "required for the http sink")),
        }
    }

    let mut countries = HashSet::new();
    for country in &config.countries {
        if !countries.insert(country.id) {
            errors.push(ValidationError::new("countries", format!("duplicate id {}", country.id)));
        }
    }

    let mut users = HashSet::new();
    for user in &config.users {
        if user.id <= 0 {
            errors.push(ValidationError::new("users", format!("id {} must be positive", user.id)));
        }
        if !users.insert(user.id) {
            errors.push(ValidationError::new("users", format!("duplicate id {}", user.id)));
        }
        if !countries.contains(&user.country_id) {
            errors.push(ValidationError::new(
                "users",
                format!("user {} references unknown country {}", user.id, user.country_id),
            ));
        }
    }

    let mut gateways = HashSet::new();
    for gateway in &config.gateways {
        if !gateways.insert(gateway.id) {
            errors.push(ValidationError::new("gateways", format!("duplicate id {}", gateway.id)));
        }
        for country in &gateway.countries {
            if !countries.contains(country) {
                errors.push(ValidationError::new(
                    "gateways",
                    format!("gateway {} references unknown country {}", gateway.id, country),
                ));
            }
        }
        if gateway.kind == BackendKind::Http {
            match gateway.endpoint.as_deref().map(Url::parse) {
                Some(Ok(_)) => {}
                Some(Err(e)) => errors.push(ValidationError::new(
                    "gateways",
                    format!("gateway {} endpoint: {}", gateway.id, e),
                )),
                None => errors.push(ValidationError::new(
                    "gateways",
                    format!("gateway {} is http but has no endpoint", gateway.id),
                )),
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
