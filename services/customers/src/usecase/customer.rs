use chrono::Utc;
use uuid::Uuid;

use crate::domain::repository::CustomerRepository;
use crate::domain::types::{Customer, normalize_email, normalize_name};
use crate::error::CustomersServiceError;

// ── CreateCustomer ───────────────────────────────────────────────────────────

pub struct CreateCustomerInput {
    pub name: String,
    pub email: String,
}

pub struct CreateCustomerUseCase<R: CustomerRepository> {
    pub repo: R,
}

impl<R: CustomerRepository> CreateCustomerUseCase<R> {
    pub async fn execute(
        &self,
        input: CreateCustomerInput,
    ) -> Result<Customer, CustomersServiceError> {
        let name = normalize_name(&input.name).ok_or(CustomersServiceError::InvalidName)?;
        let email = normalize_email(&input.email).ok_or(CustomersServiceError::InvalidEmail)?;
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::now_v7(),
            name,
            email,
            created_at: now,
            updated_at: now,
        };
        self.repo.create(&customer).await?;
        Ok(customer)
    }
}

// ── GetCustomer ──────────────────────────────────────────────────────────────

pub struct GetCustomerUseCase<R: CustomerRepository> {
    pub repo: R,
}

impl<R: CustomerRepository> GetCustomerUseCase<R> {
    pub async fn execute(&self, id: Uuid) -> Result<Customer, CustomersServiceError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(CustomersServiceError::CustomerNotFound)
    }
}

// ── UpdateCustomer ───────────────────────────────────────────────────────────

pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

pub struct UpdateCustomerUseCase<R: CustomerRepository> {
    pub repo: R,
}

impl<R: CustomerRepository> UpdateCustomerUseCase<R> {
    pub async fn execute(
        &self,
        id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<Customer, CustomersServiceError> {
        if input.name.is_none() && input.email.is_none() {
            return Err(CustomersServiceError::MissingData);
        }
        let name = input
            .name
            .map(|n| normalize_name(&n).ok_or(CustomersServiceError::InvalidName))
            .transpose()?;
        let email = input
            .email
            .map(|e| normalize_email(&e).ok_or(CustomersServiceError::InvalidEmail))
            .transpose()?;

        let mut customer = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(CustomersServiceError::CustomerNotFound)?;
        if let Some(name) = name {
            customer.name = name;
        }
        if let Some(email) = email {
            customer.email = email;
        }
        // Consumers order events by this timestamp, so it must move forward.
        let now = Utc::now();
        customer.updated_at = if now > customer.updated_at {
            now
        } else {
            customer.updated_at + chrono::Duration::microseconds(1)
        };
        self.repo.update(&customer).await?;
        Ok(customer)
    }
}

// ── DeleteCustomer ───────────────────────────────────────────────────────────

pub struct DeleteCustomerUseCase<R: CustomerRepository> {
    pub repo: R,
}

impl<R: CustomerRepository> DeleteCustomerUseCase<R> {
    pub async fn execute(&self, id: Uuid) -> Result<(), CustomersServiceError> {
        if self.repo.delete(id, Utc::now()).await? {
            Ok(())
        } else {
            Err(CustomersServiceError::CustomerNotFound)
        }
    }
}
