#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::Customer;
use crate::error::CustomersServiceError;

/// Repository for customers. Every mutation queues the matching customer
/// event in the same transaction.
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomersServiceError>;

    /// Insert the customer and queue `customer.created`.
    /// Fails with `EmailTaken` if another customer uses the email.
    async fn create(&self, customer: &Customer) -> Result<(), CustomersServiceError>;

    /// Store the new name/email and queue `customer.updated`.
    async fn update(&self, customer: &Customer) -> Result<(), CustomersServiceError>;

    /// Delete the customer and queue `customer.deleted`. Returns `false`
    /// (and queues nothing) if there was no such customer.
    async fn delete(
        &self,
        id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, CustomersServiceError>;
}
