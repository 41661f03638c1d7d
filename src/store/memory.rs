//! In-memory stores backed by `DashMap`.
//!
//! Used by the binary (seeded from configuration fixtures) and by tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::domain::{
    Country, CountryId, Gateway, GatewayId, NewTransaction, Transaction, TransactionId,
    TransactionStatus, User, UserId,
};
use crate::store::{CountryStore, GatewayStore, StoreError, StoreResult, TransactionStore, UserStore};

/// Thread-safe user table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<DashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::new();
        for user in users {
            store.insert(user);
        }
        store
    }

    pub fn insert(&self, user: User) {
        self.inner.insert(user.id, user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.inner.get(&id).map(|r| r.value().clone()))
    }
}

/// Thread-safe country table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCountryStore {
    inner: Arc<DashMap<CountryId, Country>>,
}

impl InMemoryCountryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_countries(countries: impl IntoIterator<Item = Country>) -> Self {
        let store = Self::new();
        for country in countries {
            store.inner.insert(country.id, country);
        }
        store
    }
}

#[async_trait]
impl CountryStore for InMemoryCountryStore {
    async fn get_country(&self, id: CountryId) -> StoreResult<Option<Country>> {
        Ok(self.inner.get(&id).map(|r| r.value().clone()))
    }
}

/// Thread-safe gateway table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGatewayStore {
    inner: Arc<DashMap<GatewayId, Gateway>>,
}

impl InMemoryGatewayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gateways(gateways: impl IntoIterator<Item = Gateway>) -> Self {
        let store = Self::new();
        for gateway in gateways {
            store.insert(gateway);
        }
        store
    }

    pub fn insert(&self, gateway: Gateway) {
        self.inner.insert(gateway.id, gateway);
    }
}

#[async_trait]
impl GatewayStore for InMemoryGatewayStore {
    async fn active_for_country(&self, country: CountryId) -> StoreResult<Vec<Gateway>> {
        let mut gateways: Vec<Gateway> = self
            .inner
            .iter()
            .filter(|r| r.value().is_active() && r.value().serves(country))
            .map(|r| r.value().clone())
            .collect();
        gateways.sort_by_key(|g| (g.priority, g.id));
        Ok(gateways)
    }

    async fn all_gateways(&self) -> StoreResult<Vec<Gateway>> {
        let mut gateways: Vec<Gateway> = self.inner.iter().map(|r| r.value().clone()).collect();
        gateways.sort_by_key(|g| g.id);
        Ok(gateways)
    }
}

/// Thread-safe transaction table with store-assigned identities.
#[derive(Debug, Clone)]
pub struct InMemoryTransactionStore {
    inner: Arc<DashMap<TransactionId, Transaction>>,
    next_id: Arc<AtomicI64>,
}

impl Default for InMemoryTransactionStore {
    fn default() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, tx: NewTransaction) -> StoreResult<Transaction> {
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let record = Transaction::pending(id, &tx, Utc::now());
        self.inner.insert(id, record.clone());
        Ok(record)
    }

    async fn update_status(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> StoreResult<Transaction> {
        // The shard lock held by `get_mut` makes the compare and the write atomic.
        let mut entry = self.inner.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "transaction",
            id: id.0,
        })?;
        if entry.status != expected {
            return Err(StoreError::StatusConflict {
                expected,
                current: entry.status,
            });
        }
        entry.status = status;
        Ok(entry.clone())
    }

    async fn get(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        Ok(self.inner.get(&id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> StoreResult<Vec<Transaction>> {
        let mut all: Vec<Transaction> = self.inner.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|tx| tx.id);
        Ok(all)
    }
}
