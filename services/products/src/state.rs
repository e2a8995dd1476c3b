use sea_orm::DatabaseConnection;

use crate::infra::db::DbKnownCustomerRepository;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    pub fn known_customer_repo(&self) -> DbKnownCustomerRepository {
        DbKnownCustomerRepository::new(self.db.clone())
    }
}
