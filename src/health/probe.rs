//! Health probes used by the gateway selector.
//!
//! A probe is synchronous and returns a boolean. Network checks happen in the
//! background (`active.rs`) and are read here through the registry.

use crate::domain::Gateway;
use crate::health::state::HealthRegistry;

/// Decides whether a candidate gateway may receive traffic right now.
pub trait HealthProbe: Send + Sync {
    fn is_healthy(&self, gateway: &Gateway) -> bool;
}

/// Liveness no-op: every gateway is considered healthy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHealthy;

impl HealthProbe for AlwaysHealthy {
    fn is_healthy(&self, _gateway: &Gateway) -> bool {
        true
    }
}

/// Reads the cached health maintained by active and passive checks.
///
/// Unhealthy gateways are let through once per recovery cooldown.
#[derive(Debug, Clone)]
pub struct CachedHealthProbe {
    registry: HealthRegistry,
}

impl CachedHealthProbe {
    pub fn new(registry: HealthRegistry) -> Self {
        Self { registry }
    }
}

impl HealthProbe for CachedHealthProbe {
    fn is_healthy(&self, gateway: &Gateway) -> bool {
        self.registry.admit(gateway.id)
    }
}
