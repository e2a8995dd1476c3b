use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use bazaar_customers::domain::repository::CustomerRepository;
use bazaar_customers::domain::types::Customer;
use bazaar_customers::error::CustomersServiceError;
use bazaar_customers_schema::customers;
use bazaar_testing::db;

// ── MockCustomerRepo ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockCustomerRepo {
    pub customers: Arc<Mutex<Vec<Customer>>>,
}

impl MockCustomerRepo {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self {
            customers: Arc::new(Mutex::new(customers)),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Customer> {
        self.customers.lock().unwrap().clone()
    }
}

impl CustomerRepository for MockCustomerRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomersServiceError> {
        Ok(self.all().into_iter().find(|c| c.id == id))
    }

    async fn create(&self, customer: &Customer) -> Result<(), CustomersServiceError> {
        let mut customers = self.customers.lock().unwrap();
        if customers.iter().any(|c| c.email == customer.email) {
            return Err(CustomersServiceError::EmailTaken);
        }
        customers.push(customer.clone());
        Ok(())
    }

    async fn update(&self, customer: &Customer) -> Result<(), CustomersServiceError> {
        let mut customers = self.customers.lock().unwrap();
        match customers.iter_mut().find(|c| c.id == customer.id) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(())
            }
            None => Err(CustomersServiceError::CustomerNotFound),
        }
    }

    async fn delete(
        &self,
        id: Uuid,
        _deleted_at: DateTime<Utc>,
    ) -> Result<bool, CustomersServiceError> {
        let mut customers = self.customers.lock().unwrap();
        let before = customers.len();
        customers.retain(|c| c.id != id);
        Ok(customers.len() < before)
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn test_customer() -> Customer {
    let created_at = Utc::now() - chrono::Duration::hours(1);
    Customer {
        id: Uuid::now_v7(),
        name: "Ada Lovelace".to_owned(),
        email: "ada@example.com".to_owned(),
        created_at,
        updated_at: created_at,
    }
}

/// In-memory database with the `customers` and `outbox_events` tables.
pub async fn customers_db() -> DatabaseConnection {
    let db = db::outbox_db().await;
    db::create_table(&db, customers::Entity).await;
    db
}

/// Poll `condition` until it holds. Panics after five seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
