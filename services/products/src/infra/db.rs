use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    sea_query::{Expr, OnConflict},
};
use uuid::Uuid;

use bazaar_products_schema::known_customers;

use crate::domain::repository::KnownCustomerRepository;
use crate::domain::types::KnownCustomer;
use crate::error::ProductsServiceError;

#[derive(Clone)]
pub struct DbKnownCustomerRepository {
    pub db: DatabaseConnection,
}

impl DbKnownCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Write `row` unless the stored version is the same or newer.
    ///
    /// Conditional update first, then an insert that yields to a concurrent
    /// one, then the update once more for the row that insert lost to.
    async fn write_if_newer(&self, row: known_customers::Model) -> Result<bool, DbErr> {
        if self.update_if_older(&row).await? {
            return Ok(true);
        }
        let inserted = known_customers::Entity::insert(known_customers::ActiveModel {
            customer_id: Set(row.customer_id),
            name: Set(row.name.clone()),
            email: Set(row.email.clone()),
            version: Set(row.version),
            deleted_at: Set(row.deleted_at),
        })
        .on_conflict(
            OnConflict::column(known_customers::Column::CustomerId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await?;
        if inserted > 0 {
            return Ok(true);
        }
        self.update_if_older(&row).await
    }

    async fn update_if_older(&self, row: &known_customers::Model) -> Result<bool, DbErr> {
        use known_customers::Column;

        let result = known_customers::Entity::update_many()
            .col_expr(Column::Name, Expr::value(row.name.clone()))
            .col_expr(Column::Email, Expr::value(row.email.clone()))
            .col_expr(Column::Version, Expr::value(row.version))
            .col_expr(Column::DeletedAt, Expr::value(row.deleted_at))
            .filter(Column::CustomerId.eq(row.customer_id))
            .filter(Column::Version.lt(row.version))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

impl KnownCustomerRepository for DbKnownCustomerRepository {
    async fn find(&self, customer_id: Uuid) -> Result<Option<KnownCustomer>, ProductsServiceError> {
        let model = known_customers::Entity::find_by_id(customer_id)
            .filter(known_customers::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find known customer")?;
        Ok(model.and_then(known_customer_from_model))
    }

    async fn upsert(&self, customer: &KnownCustomer) -> Result<bool, ProductsServiceError> {
        let row = known_customers::Model {
            customer_id: customer.customer_id,
            name: Some(customer.name.clone()),
            email: Some(customer.email.clone()),
            version: customer.version,
            deleted_at: None,
        };
        Ok(self
            .write_if_newer(row)
            .await
            .context("upsert known customer")?)
    }

    async fn tombstone(
        &self,
        customer_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, ProductsServiceError> {
        let row = known_customers::Model {
            customer_id,
            name: None,
            email: None,
            version: deleted_at,
            deleted_at: Some(deleted_at),
        };
        Ok(self
            .write_if_newer(row)
            .await
            .context("tombstone known customer")?)
    }
}

fn known_customer_from_model(m: known_customers::Model) -> Option<KnownCustomer> {
    Some(KnownCustomer {
        customer_id: m.customer_id,
        name: m.name?,
        email: m.email?,
        version: m.version,
    })
}
