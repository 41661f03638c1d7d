//! Orchestrator error taxonomy.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{TransactionId, TransactionStatus, UserId};
use crate::events::PublishError;
use crate::gateway::{BackendError, SelectionError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid amount {0}: must be greater than zero")]
    InvalidAmount(Decimal),

    #[error("invalid user id {0}")]
    InvalidUser(UserId),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error(transparent)]
    Routing(#[from] SelectionError),

    #[error("failed to persist transaction: {0}")]
    PersistenceFailed(#[source] StoreError),

    #[error("backend unavailable after {attempts} attempts")]
    BackendUnavailable {
        attempts: u32,
        last: Option<BackendError>,
    },

    #[error("backend rejected transaction: {0}")]
    BackendRejected(#[source] BackendError),

    #[error("transaction processed but event not published: {0}")]
    PublishFailed(#[source] PublishError),

    #[error("failed to serialize transaction: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),

    #[error("transaction {id} cannot move from {from} to {to}")]
    IllegalTransition {
        id: TransactionId,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    #[error("failed to record status of transaction {id}, record may be inconsistent: {source}")]
    ReconciliationFailed {
        id: TransactionId,
        #[source]
        source: StoreError,
    },
}

/// Stable classification of `OrchestratorError` for outer layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    NoGatewayAvailable,
    GatewaysUnhealthy,
    BackendUnavailable,
    BackendRejected,
    CircuitOpen,
    PublishFailed,
    IllegalTransition,
    PersistenceFailed,
    ReconciliationFailed,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NoGatewayAvailable => "no_gateway_available",
            ErrorKind::GatewaysUnhealthy => "gateways_unhealthy",
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::BackendRejected => "backend_rejected",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::PublishFailed => "publish_failed",
            ErrorKind::IllegalTransition => "illegal_transition",
            ErrorKind::PersistenceFailed => "persistence_failed",
            ErrorKind::ReconciliationFailed => "reconciliation_failed",
            ErrorKind::Internal => "internal",
        }
    }
}

impl OrchestratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::InvalidAmount(_) | OrchestratorError::InvalidUser(_) => {
                ErrorKind::Validation
            }
            OrchestratorError::UserNotFound(_) | OrchestratorError::TransactionNotFound(_) => {
                ErrorKind::NotFound
            }
            OrchestratorError::Routing(SelectionError::NoGatewayAvailable(_)) => {
                ErrorKind::NoGatewayAvailable
            }
            OrchestratorError::Routing(SelectionError::GatewaysUnhealthy { .. }) => {
                ErrorKind::GatewaysUnhealthy
            }
            OrchestratorError::PersistenceFailed(_) => ErrorKind::PersistenceFailed,
            OrchestratorError::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            OrchestratorError::BackendRejected(_) => ErrorKind::BackendRejected,
            OrchestratorError::PublishFailed(PublishError::CircuitOpen { .. }) => {
                ErrorKind::CircuitOpen
            }
            OrchestratorError::PublishFailed(_) => ErrorKind::PublishFailed,
            OrchestratorError::Serialization(_) => ErrorKind::Internal,
            OrchestratorError::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            OrchestratorError::ReconciliationFailed { .. } => ErrorKind::ReconciliationFailed,
        }
    }
}
