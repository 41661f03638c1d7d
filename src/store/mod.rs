//! Storage ports.
//!
//! # Data Flow
//! ```text
//! Orchestrator
//!     → UserStore::get_user (resolve routing country)
//!     → GatewayStore::active_for_country (candidates, priority order)
//!     → TransactionStore::create (pending record)
//!     → TransactionStore::update_status (compare-and-swap to terminal)
//! ```
//!
//! # Design Decisions
//! - Stores own their own concurrency guarantees
//! - `update_status` only applies when the stored status matches `expected`
//! - Missing rows are `Ok(None)` on reads, `StoreError::NotFound` on writes

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    Country, CountryId, Gateway, NewTransaction, Transaction, TransactionId,
    TransactionStatus, User, UserId,
};

pub use memory::{InMemoryCountryStore, InMemoryGatewayStore, InMemoryTransactionStore, InMemoryUserStore};

/// Errors surfaced by storage backends.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The stored status differs from the one the writer expected.
    #[error("status conflict: expected {expected}, found {current}")]
    StatusConflict {
        expected: TransactionStatus,
        current: TransactionStatus,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait CountryStore: Send + Sync {
    async fn get_country(&self, id: CountryId) -> StoreResult<Option<Country>>;
}

#[async_trait]
pub trait GatewayStore: Send + Sync {
    /// Active gateways serving `country`, ascending by priority.
    /// Empty when none match.
    async fn active_for_country(&self, country: CountryId) -> StoreResult<Vec<Gateway>>;

    async fn all_gateways(&self) -> StoreResult<Vec<Gateway>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist a new pending transaction and return the stored record.
    async fn create(&self, tx: NewTransaction) -> StoreResult<Transaction>;

    /// Move `id` from `expected` to `status`.
    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> StoreResult<Transaction>;

    async fn get(&self, id: TransactionId) -> StoreResult<Option<Transaction>>;

    async fn list(&self) -> StoreResult<Vec<Transaction>>;
}
