use axum::{
    extract::{
        rejection::PathRejection,
        Path, Query, State,
    },
    response::{IntoResponse, Response},
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::domain::{GatewayId, GatewayStatus, TransactionId, TransactionRequest};
use crate::health::HealthState;
use crate::http::negotiate::RequestBody;
use crate::http::request::RequestId;
use crate::http::response::{bad_request, ApiResponse, TransactionSummary};
use crate::http::server::AppState;
use crate::orchestrator::OrchestratorError;
use crate::resilience::CircuitSnapshot;

pub async fn deposit(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    RequestBody(request): RequestBody<TransactionRequest>,
) -> Response {
    tracing::debug!(request_id = %request_id.0, user_id = %request.user_id, "Deposit request");

    match state.orchestrator.deposit(request).await {
        Ok(tx) => ApiResponse::ok("Transaction deposit successfully", TransactionSummary::from(&tx))
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn withdrawal(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    RequestBody(request): RequestBody<TransactionRequest>,
) -> Response {
    tracing::debug!(request_id = %request_id.0, user_id = %request.user_id, "Withdrawal request");

    match state.orchestrator.withdrawal(request).await {
        Ok(tx) => ApiResponse::ok("Transaction withdrawal successfully", TransactionSummary::from(&tx))
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// `GET /callback?id=101&status=done&gateway=1`
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub id: Option<String>,
    pub status: Option<String>,
    pub gateway: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let (Some(status), Some(gateway)) = (
        params.status.filter(|s| !s.trim().is_empty()),
        params.gateway.filter(|g| !g.trim().is_empty()),
    ) else {
        tracing::warn!(request_id = %request_id.0, "Callback missing status or gateway");
        return bad_request("status and gateway query parameters are required");
    };

    let Some(id) = params.id.as_deref().and_then(|v| v.trim().parse::<i64>().ok()) else {
        return bad_request("id must be an integer");
    };
    let Ok(gateway) = gateway.trim().parse::<i64>() else {
        return bad_request("gateway must be an integer");
    };

    match state
        .orchestrator
        .reconcile(TransactionId(id), GatewayId(gateway), &status)
        .await
    {
        Ok(tx) => ApiResponse::ok("Transaction Callback successfully", TransactionSummary::from(&tx))
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_transaction(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = id else {
        return bad_request("transaction id must be an integer");
    };

    match state.orchestrator.get_transaction(TransactionId(id)).await {
        Ok(tx) => ApiResponse::ok("Transaction found", tx).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn health() -> Response {
    ApiResponse::ok("ok", serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })).into_response()
}

#[derive(Debug, Serialize)]
pub struct GatewayStatusView {
    pub id: GatewayId,
    pub name: String,
    pub status: GatewayStatus,
    pub priority: u32,
    pub health: HealthState,
    /// ISO codes of the countries served.
    pub countries: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub circuit_breaker: CircuitSnapshot,
    pub gateways: Vec<GatewayStatusView>,
    pub transactions: usize,
}

pub async fn status(State(state): State<AppState>) -> Response {
    let gateways = match state.gateways.all_gateways().await {
        Ok(gateways) => gateways,
        Err(e) => return OrchestratorError::PersistenceFailed(e).into_response(),
    };
    let transactions = match state.orchestrator.list_transactions().await {
        Ok(all) => all.len(),
        Err(e) => return e.into_response(),
    };

    let mut views = Vec::with_capacity(gateways.len());
    for g in gateways {
        let mut codes = Vec::with_capacity(g.countries.len());
        for country in &g.countries {
            match state.countries.get_country(*country).await {
                Ok(Some(c)) => codes.push(c.code),
                Ok(None) => codes.push(country.to_string()),
                Err(e) => return OrchestratorError::PersistenceFailed(e).into_response(),
            }
        }
        views.push(GatewayStatusView {
            health: state.health.state(g.id),
            id: g.id,
            name: g.name,
            status: g.status,
            priority: g.priority,
            countries: codes,
        });
    }

    let status = SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        circuit_breaker: state.orchestrator.publisher().breaker().snapshot(),
        gateways: views,
        transactions,
    };

    ApiResponse::ok("operational", status).into_response()
}
