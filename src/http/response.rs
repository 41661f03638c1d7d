//! Response envelope and error mapping.
//!
//! # Responsibilities
//! - Wrap every body in `{status_code, message, data}`
//! - Map each `ErrorKind` to an HTTP status code
//!
//! # Design Decisions
//! - Error bodies carry the stable kind string in `data.kind`
//! - Internal error details are logged, not returned

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::domain::{Transaction, TransactionId, TransactionStatus};
use crate::orchestrator::{ErrorKind, OrchestratorError};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, data)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Summary returned by deposit, withdrawal and callback.
#[derive(Debug, Serialize)]
pub struct TransactionSummary {
    #[serde(rename = "transactionID")]
    pub transaction_id: TransactionId,
    pub status: TransactionStatus,
}

impl From<&Transaction> for TransactionSummary {
    fn from(tx: &Transaction) -> Self {
        Self {
            transaction_id: tx.id,
            status: tx.status,
        }
    }
}

/// Error body for requests rejected before reaching the orchestrator.
pub fn bad_request(message: impl Into<String>) -> Response {
    ApiResponse::new(
        StatusCode::BAD_REQUEST,
        message,
        json!({ "kind": ErrorKind::Validation.as_str() }),
    )
    .into_response()
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::NoGatewayAvailable
        | ErrorKind::GatewaysUnhealthy
        | ErrorKind::BackendUnavailable
        | ErrorKind::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::BackendRejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::PublishFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::IllegalTransition => StatusCode::CONFLICT,
        ErrorKind::PersistenceFailed | ErrorKind::ReconciliationFailed | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        let message = match kind {
            ErrorKind::Internal => {
                tracing::error!(error = %self, "Internal error");
                "internal error".to_string()
            }
            _ => self.to_string(),
        };

        ApiResponse::new(status, message, json!({ "kind": kind.as_str() })).into_response()
    }
}
