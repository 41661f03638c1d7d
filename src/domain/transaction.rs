//! Transaction record and its lifecycle.
//!
//! # States
//! - Pending: created with the record, backend outcome not final
//! - Failed: terminal, backend gave up or rejected
//! - Done: terminal, confirmed by the gateway callback
//!
//! # State Transitions
//! ```text
//! Pending → Failed
//! Pending → Done
//! ```
//! Terminal states are never re-opened.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ids::{CountryId, GatewayId, TransactionId, UserId};

/// Kind of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Failed,
    Done,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Whether `self → next` is a legal lifecycle step: only Pending moves,
    /// and only into a terminal state.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }

    /// Map a status reported by an external gateway.
    ///
    /// Unrecognized values map to `Pending`: an unknown external state never
    /// moves a transaction towards a terminal state.
    pub fn from_external(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "failed" => TransactionStatus::Failed,
            "done" => TransactionStatus::Done,
            _ => TransactionStatus::Pending,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction about to be persisted. The store assigns identity and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub kind: TransactionType,
    pub user_id: UserId,
    pub gateway_id: GatewayId,
    pub country_id: CountryId,
}

/// A persisted transaction.
///
/// User, gateway and country are denormalized at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub user_id: UserId,
    pub gateway_id: GatewayId,
    pub country_id: CountryId,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Materialize a pending record from a request that passed validation.
    pub fn pending(id: TransactionId, new: &NewTransaction, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            amount: new.amount,
            kind: new.kind,
            status: TransactionStatus::Pending,
            user_id: new.user_id,
            gateway_id: new.gateway_id,
            country_id: new.country_id,
            created_at,
        }
    }
}
