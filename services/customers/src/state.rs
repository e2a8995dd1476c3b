use sea_orm::DatabaseConnection;

use crate::infra::db::DbCustomerRepository;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
}

impl AppState {
    pub fn customer_repo(&self) -> DbCustomerRepository {
        DbCustomerRepository::new(self.db.clone())
    }
}
