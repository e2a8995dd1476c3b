use uuid::Uuid;

use bazaar_events::contracts::customer::{CustomerCreated, CustomerDeleted, CustomerUpdated};

use crate::domain::repository::KnownCustomerRepository;
use crate::domain::types::{KnownCustomer, SyncOutcome};
use crate::error::ProductsServiceError;

// ── SyncCustomer ─────────────────────────────────────────────────────────────

/// Applies customer events to the local directory. Every operation is
/// idempotent and ignores events older than the stored state.
pub struct SyncCustomerUseCase<R: KnownCustomerRepository> {
    pub repo: R,
}

impl<R: KnownCustomerRepository> SyncCustomerUseCase<R> {
    pub async fn created(&self, event: CustomerCreated) -> Result<SyncOutcome, ProductsServiceError> {
        let customer = KnownCustomer {
            customer_id: event.customer_id,
            name: event.name,
            email: event.email,
            version: event.created_at,
        };
        self.repo.upsert(&customer).await.map(SyncOutcome::from_applied)
    }

    /// Updates carry the full state, so an update for an unknown customer
    /// (created event still in flight) inserts it.
    pub async fn updated(&self, event: CustomerUpdated) -> Result<SyncOutcome, ProductsServiceError> {
        let customer = KnownCustomer {
            customer_id: event.customer_id,
            name: event.name,
            email: event.email,
            version: event.updated_at,
        };
        self.repo.upsert(&customer).await.map(SyncOutcome::from_applied)
    }

    pub async fn deleted(&self, event: CustomerDeleted) -> Result<SyncOutcome, ProductsServiceError> {
        self.repo
            .tombstone(event.customer_id, event.deleted_at)
            .await
            .map(SyncOutcome::from_applied)
    }
}

// ── GetKnownCustomer ─────────────────────────────────────────────────────────

pub struct GetKnownCustomerUseCase<R: KnownCustomerRepository> {
    pub repo: R,
}

impl<R: KnownCustomerRepository> GetKnownCustomerUseCase<R> {
    pub async fn execute(&self, customer_id: Uuid) -> Result<KnownCustomer, ProductsServiceError> {
        self.repo
            .find(customer_id)
            .await?
            .ok_or(ProductsServiceError::CustomerNotFound)
    }
}
