//! Transaction orchestrator.
//!
//! # Responsibilities
//! - Validate a deposit/withdrawal request
//! - Resolve the user and route to a healthy gateway for the user's country
//! - Persist a pending transaction, submit it to the backend with retries,
//!   and announce it on the event stream
//! - Reconcile external status callbacks into terminal states
//!
//! # Data Flow
//! ```text
//! deposit / withdrawal:
//!     validate → UserStore → GatewaySelector::select_gateway
//!     → TransactionStore::create (Pending)
//!     → GatewaySelector::submit (retried while transient)
//!         failure → TransactionStore::update_status(Pending → Failed)
//!     → EventPublisher::publish (JSON)
//!
//! reconcile:
//!     TransactionStore::get → state machine check
//!     → TransactionStore::update_status(Pending → mapped status)
//! ```
//!
//! # Design Decisions
//! - Status writes are compare-and-swap from Pending, so a terminal state is
//!   never overwritten regardless of how callbacks interleave
//! - An identical redelivery returns the current record without writing
//! - A publish failure leaves the transaction Pending and fails the call;
//!   there is no background republish

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::domain::{
    GatewayId, NewTransaction, PayloadFormat, Transaction, TransactionId, TransactionRequest,
    TransactionStatus, TransactionType,
};
use crate::events::EventPublisher;
use crate::gateway::{BackendError, GatewaySelector};
use crate::observability::metrics;
use crate::orchestrator::error::OrchestratorError;
use crate::resilience::{RetryError, RetryPolicy};
use crate::store::{StoreError, TransactionStore, UserStore};

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

pub struct TransactionOrchestrator {
    users: Arc<dyn UserStore>,
    transactions: Arc<dyn TransactionStore>,
    selector: Arc<GatewaySelector>,
    publisher: Arc<EventPublisher>,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl TransactionOrchestrator {
    pub fn new(
        users: Arc<dyn UserStore>,
        transactions: Arc<dyn TransactionStore>,
        selector: Arc<GatewaySelector>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            users,
            transactions,
            selector,
            publisher,
            retry: RetryPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Abort pending backend retries when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn publisher(&self) -> &Arc<EventPublisher> {
        &self.publisher
    }

    pub async fn deposit(&self, request: TransactionRequest) -> OrchestratorResult<Transaction> {
        self.process(request, TransactionType::Deposit).await
    }

    pub async fn withdrawal(&self, request: TransactionRequest) -> OrchestratorResult<Transaction> {
        self.process(request, TransactionType::Withdrawal).await
    }

    pub async fn get_transaction(&self, id: TransactionId) -> OrchestratorResult<Transaction> {
        self.transactions
            .get(id)
            .await
            .map_err(OrchestratorError::PersistenceFailed)?
            .ok_or(OrchestratorError::TransactionNotFound(id))
    }

    pub async fn list_transactions(&self) -> OrchestratorResult<Vec<Transaction>> {
        self.transactions
            .list()
            .await
            .map_err(OrchestratorError::PersistenceFailed)
    }

    async fn process(
        &self,
        request: TransactionRequest,
        kind: TransactionType,
    ) -> OrchestratorResult<Transaction> {
        let span = tracing::info_span!("transaction", kind = %kind, user_id = %request.user_id);

        let result = self.run(request, kind).instrument(span.clone()).await;
        let _enter = span.enter();
        match &result {
            Ok(tx) => {
                tracing::info!(transaction_id = %tx.id, gateway_id = %tx.gateway_id, "Transaction accepted");
                metrics::record_transaction(kind.as_str(), "success");
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind().as_str(), "Transaction failed");
                metrics::record_transaction(kind.as_str(), e.kind().as_str());
            }
        }
        result
    }

    async fn run(
        &self,
        request: TransactionRequest,
        kind: TransactionType,
    ) -> OrchestratorResult<Transaction> {
        validate(&request)?;

        let user = self
            .users
            .get_user(request.user_id)
            .await
            .map_err(OrchestratorError::PersistenceFailed)?
            .ok_or(OrchestratorError::UserNotFound(request.user_id))?;

        if let Some(hint) = request.country_id.filter(|c| *c != user.country_id) {
            tracing::debug!(hint = %hint, country = %user.country_id, "Ignoring country hint, routing by user country");
        }

        let gateway = self
            .selector
            .select_gateway(user.country_id, request.gateway_id)
            .await?;

        let tx = self
            .transactions
            .create(NewTransaction {
                amount: request.amount,
                kind,
                user_id: user.id,
                gateway_id: gateway.id,
                country_id: user.country_id,
            })
            .await
            .map_err(OrchestratorError::PersistenceFailed)?;
        tracing::debug!(transaction_id = %tx.id, gateway = %gateway.name, "Pending transaction created");

        if let Err(e) = self.submit_with_retry(&tx, kind).await {
            self.mark_failed(tx.id).await?;
            return Err(e);
        }

        let payload = serde_json::to_vec(&tx)?;
        self.publisher
            .publish(tx.id, &payload, PayloadFormat::Json.content_type())
            .await
            .map_err(OrchestratorError::PublishFailed)?;

        Ok(tx)
    }

    async fn submit_with_retry(
        &self,
        tx: &Transaction,
        kind: TransactionType,
    ) -> OrchestratorResult<()> {
        let selector = &self.selector;
        let outcome = self
            .retry
            .retry_if(
                &self.cancel,
                move |attempt| {
                    tracing::debug!(transaction_id = %tx.id, attempt, "Submitting to backend");
                    selector.submit(tx, kind)
                },
                BackendError::is_transient,
            )
            .await;

        match &outcome {
            Ok(()) => selector.record_outcome(tx.gateway_id, Ok(())),
            Err(RetryError::Exhausted { last, .. }) => selector.record_outcome(tx.gateway_id, Err(last)),
            Err(_) => {}
        }

        outcome.map_err(|e| match e {
            RetryError::Permanent { error, .. } => OrchestratorError::BackendRejected(error),
            other => {
                tracing::error!(transaction_id = %tx.id, attempts = other.attempts(), "Backend retries exhausted");
                OrchestratorError::BackendUnavailable {
                    attempts: other.attempts(),
                    last: other.into_last_error(),
                }
            }
        })
    }

    async fn mark_failed(&self, id: TransactionId) -> OrchestratorResult<()> {
        self.transactions
            .update_status(id, TransactionStatus::Pending, TransactionStatus::Failed)
            .await
            .map(|_| ())
            .map_err(|source| {
                tracing::error!(transaction_id = %id, error = %source, "Failed to mark transaction failed");
                OrchestratorError::ReconciliationFailed { id, source }
            })
    }

    /// Apply an external status callback.
    ///
    /// Unknown statuses map to Pending, which is a no-op on a pending
    /// transaction and an illegal transition on a terminal one.
    pub async fn reconcile(
        &self,
        id: TransactionId,
        external_gateway: GatewayId,
        external_status: &str,
    ) -> OrchestratorResult<Transaction> {
        let target = TransactionStatus::from_external(external_status);
        let span = tracing::info_span!("reconcile", transaction_id = %id, gateway_id = %external_gateway, status = %target);

        async move {
            let current = self.get_transaction(id).await?;
            if current.gateway_id != external_gateway {
                tracing::warn!(expected = %current.gateway_id, "Callback gateway differs from routed gateway");
            }

            if current.status == target {
                tracing::debug!("Duplicate callback, status unchanged");
                return Ok(current);
            }
            if !current.status.can_transition_to(target) {
                return Err(OrchestratorError::IllegalTransition {
                    id,
                    from: current.status,
                    to: target,
                });
            }

            match self.transactions.update_status(id, current.status, target).await {
                Ok(updated) => {
                    tracing::info!(from = %current.status, "Transaction reconciled");
                    Ok(updated)
                }
                // Another writer got there first.
                Err(StoreError::StatusConflict { current: now, .. }) if now == target => {
                    self.get_transaction(id).await
                }
                Err(StoreError::StatusConflict { current: now, .. }) => {
                    Err(OrchestratorError::IllegalTransition {
                        id,
                        from: now,
                        to: target,
                    })
                }
                Err(StoreError::NotFound { .. }) => Err(OrchestratorError::TransactionNotFound(id)),
                Err(source) => Err(OrchestratorError::ReconciliationFailed { id, source }),
            }
        }
        .instrument(span)
        .await
    }
}

/// Reject requests that must never reach a store.
pub fn validate(request: &TransactionRequest) -> OrchestratorResult<()> {
    if request.amount <= rust_decimal::Decimal::ZERO {
        return Err(OrchestratorError::InvalidAmount(request.amount));
    }
    if !request.user_id.is_valid() {
        return Err(OrchestratorError::InvalidUser(request.user_id));
    }
    Ok(())
}
