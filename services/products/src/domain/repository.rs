use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::KnownCustomer;
use crate::error::ProductsServiceError;

/// Local customer directory. Writes are versioned: a write whose version is
/// not newer than the stored one is skipped and reported as `false`.
pub trait KnownCustomerRepository: Send + Sync {
    /// Live (not deleted) customer by id.
    fn find(
        &self,
        customer_id: Uuid,
    ) -> impl Future<Output = Result<Option<KnownCustomer>, ProductsServiceError>> + Send;

    fn upsert(
        &self,
        customer: &KnownCustomer,
    ) -> impl Future<Output = Result<bool, ProductsServiceError>> + Send;

    /// Mark the customer deleted as of `deleted_at`, clearing personal data.
    /// Unknown ids get a tombstone too.
    fn tombstone(
        &self,
        customer_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, ProductsServiceError>> + Send;
}
