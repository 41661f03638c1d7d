//! Inbound transaction request.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{CountryId, GatewayId, UserId};

/// A deposit or withdrawal request as received from the outer layer.
///
/// Transient: never persisted, validated by the orchestrator before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub amount: Decimal,
    pub user_id: UserId,
    /// Preferred gateway, honored only when it is an eligible candidate.
    #[serde(default)]
    pub gateway_id: Option<GatewayId>,
    /// Informational; routing uses the user's own country.
    #[serde(default)]
    pub country_id: Option<CountryId>,
    #[serde(default)]
    pub currency: String,
}

impl TransactionRequest {
    pub fn new(amount: Decimal, user_id: UserId, currency: impl Into<String>) -> Self {
        Self {
            amount,
            user_id,
            gateway_id: None,
            country_id: None,
            currency: currency.into(),
        }
    }
}
