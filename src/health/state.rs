//! Gateway health state machine.
//!
//! # States
//! - Unknown: never checked, treated as healthy
//! - Healthy: eligible for selection
//! - Unhealthy: skipped by the selector, except for one trial request per
//!   recovery cooldown
//!
//! # State Transitions
//! ```text
//! Healthy/Unknown → Unhealthy: consecutive failures >= unhealthy_threshold
//! Unhealthy/Unknown → Healthy: consecutive successes >= healthy_threshold
//! ```
//!
//! # Recovery
//! Gateways without active checks only report health through real traffic.
//! Once the cooldown since the last failure has elapsed, `admit` lets a single
//! request through. A success reopens the trial slot at once so the gateway can
//! collect the successes it needs; a failure pushes the next trial out by
//! another cooldown.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::HealthCheckConfig;
use crate::domain::GatewayId;

/// Health state enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// Health of a single gateway, updated lock-free.
#[derive(Debug)]
pub struct GatewayHealth {
    state: AtomicU8,
    consecutive_failures: AtomicUsize,
    consecutive_successes: AtomicUsize,
    /// Earliest instant a trial request may reach an Unhealthy gateway.
    trial_at: Mutex<Option<Instant>>,
}

impl Default for GatewayHealth {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
            trial_at: Mutex::new(None),
        }
    }
}

impl GatewayHealth {
    pub fn state(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Healthy or Unknown.
    pub fn is_healthy(&self) -> bool {
        self.state() != HealthState::Unhealthy
    }

    fn trial_slot(&self) -> MutexGuard<'_, Option<Instant>> {
        self.trial_at.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Report a successful call or check. Returns true on a transition to Healthy.
    pub fn mark_success(&self, healthy_threshold: usize) -> bool {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        if self.state() == HealthState::Healthy {
            return false;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.consecutive_successes.store(0, Ordering::Relaxed);
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            *self.trial_slot() = None;
            return true;
        }
        if self.state() == HealthState::Unhealthy {
            *self.trial_slot() = Some(Instant::now());
        }
        false
    }

    /// Report a failed call or check. Returns true on a transition to Unhealthy.
    ///
    /// The next trial request is scheduled `cooldown` after this failure.
    pub fn mark_failure(&self, unhealthy_threshold: usize, cooldown: Duration) -> bool {
        self.consecutive_successes.store(0, Ordering::Relaxed);
        if self.state() == HealthState::Unhealthy {
            *self.trial_slot() = Some(Instant::now() + cooldown);
            return false;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.consecutive_failures.store(0, Ordering::Relaxed);
            *self.trial_slot() = Some(Instant::now() + cooldown);
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            return true;
        }
        false
    }

    /// Whether a request may be sent now.
    ///
    /// Always true unless Unhealthy. An Unhealthy gateway admits one request
    /// once its trial instant has passed, then waits another `cooldown`.
    pub fn admit(&self, cooldown: Duration) -> bool {
        if self.state() != HealthState::Unhealthy {
            return true;
        }

        let now = Instant::now();
        let mut slot = self.trial_slot();
        match *slot {
            Some(at) if now >= at => {
                *slot = Some(now + cooldown);
                true
            }
            Some(_) => false,
            None => {
                *slot = Some(now + cooldown);
                false
            }
        }
    }
}

/// Health of every known gateway.
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    gateways: Arc<DashMap<GatewayId, Arc<GatewayHealth>>>,
    healthy_threshold: usize,
    unhealthy_threshold: usize,
    recovery_cooldown: Duration,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new(&HealthCheckConfig::default())
    }
}

impl HealthRegistry {
    pub fn new(config: &HealthCheckConfig) -> Self {
        Self {
            gateways: Arc::new(DashMap::new()),
            healthy_threshold: config.healthy_threshold.max(1) as usize,
            unhealthy_threshold: config.unhealthy_threshold.max(1) as usize,
            recovery_cooldown: Duration::from_secs(config.recovery_cooldown_secs),
        }
    }

    /// Health entry for `id`, created as Unknown on first use.
    pub fn entry(&self, id: GatewayId) -> Arc<GatewayHealth> {
        self.gateways.entry(id).or_default().clone()
    }

    pub fn is_healthy(&self, id: GatewayId) -> bool {
        self.gateways.get(&id).map_or(true, |h| h.is_healthy())
    }

    pub fn state(&self, id: GatewayId) -> HealthState {
        self.gateways.get(&id).map_or(HealthState::Unknown, |h| h.state())
    }

    /// Admission check used by the selector. May consume a recovery trial.
    pub fn admit(&self, id: GatewayId) -> bool {
        let Some(health) = self.gateways.get(&id).map(|h| h.clone()) else {
            return true;
        };
        let admitted = health.admit(self.recovery_cooldown);
        if admitted && health.state() == HealthState::Unhealthy {
            tracing::info!(gateway_id = %id, "Admitting trial request to unhealthy gateway");
        }
        admitted
    }

    pub fn record_success(&self, id: GatewayId, name: &str) {
        if self.entry(id).mark_success(self.healthy_threshold) {
            tracing::info!(gateway = %name, gateway_id = %id, "Gateway marked healthy");
        }
    }

    pub fn record_failure(&self, id: GatewayId, name: &str) {
        if self.entry(id).mark_failure(self.unhealthy_threshold, self.recovery_cooldown) {
            tracing::warn!(gateway = %name, gateway_id = %id, "Gateway marked unhealthy");
        }
    }
}
