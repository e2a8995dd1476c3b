use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, TransactionError, TransactionTrait,
    sea_query::Expr,
};
use uuid::Uuid;

use bazaar_events::contracts::customer::{CustomerCreated, CustomerDeleted, CustomerUpdated};
use bazaar_outbox::OutboxWriter;
use bazaar_customers_schema::customers;

use crate::domain::repository::CustomerRepository;
use crate::domain::types::Customer;
use crate::error::CustomersServiceError;

#[derive(Clone)]
pub struct DbCustomerRepository {
    pub db: DatabaseConnection,
    pub writer: OutboxWriter,
}

impl DbCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            writer: OutboxWriter::new(),
        }
    }
}

impl CustomerRepository for DbCustomerRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, CustomersServiceError> {
        let model = customers::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find customer by id")?;
        Ok(model.map(customer_from_model))
    }

    async fn create(&self, customer: &Customer) -> Result<(), CustomersServiceError> {
        let customer = customer.clone();
        let writer = self.writer;
        self.db
            .transaction::<_, (), CustomersServiceError>(|txn| {
                Box::pin(async move {
                    if email_in_use(txn, &customer.email, None)
                        .await
                        .context("check email")?
                    {
                        return Err(CustomersServiceError::EmailTaken);
                    }
                    insert_customer(txn, &customer)
                        .await
                        .context("insert customer")?;
                    let event = CustomerCreated {
                        customer_id: customer.id,
                        name: customer.name.clone(),
                        email: customer.email.clone(),
                        created_at: customer.created_at,
                    };
                    writer
                        .write_event(txn, &event)
                        .await
                        .context("queue customer.created")?;
                    Ok(())
                })
            })
            .await
            .map_err(from_txn_error)
    }

    async fn update(&self, customer: &Customer) -> Result<(), CustomersServiceError> {
        let customer = customer.clone();
        let writer = self.writer;
        self.db
            .transaction::<_, (), CustomersServiceError>(|txn| {
                Box::pin(async move {
                    if email_in_use(txn, &customer.email, Some(customer.id))
                        .await
                        .context("check email")?
                    {
                        return Err(CustomersServiceError::EmailTaken);
                    }
                    let updated = customers::Entity::update_many()
                        .col_expr(customers::Column::Name, Expr::value(customer.name.clone()))
                        .col_expr(customers::Column::Email, Expr::value(customer.email.clone()))
                        .col_expr(customers::Column::UpdatedAt, Expr::value(customer.updated_at))
                        .filter(customers::Column::Id.eq(customer.id))
                        .exec(txn)
                        .await
                        .context("update customer")?;
                    if updated.rows_affected == 0 {
                        return Err(CustomersServiceError::CustomerNotFound);
                    }
                    let event = CustomerUpdated {
                        customer_id: customer.id,
                        name: customer.name.clone(),
                        email: customer.email.clone(),
                        updated_at: customer.updated_at,
                    };
                    writer
                        .write_event(txn, &event)
                        .await
                        .context("queue customer.updated")?;
                    Ok(())
                })
            })
            .await
            .map_err(from_txn_error)
    }

    async fn delete(
        &self,
        id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<bool, CustomersServiceError> {
        let writer = self.writer;
        self.db
            .transaction::<_, bool, CustomersServiceError>(|txn| {
                Box::pin(async move {
                    let deleted = customers::Entity::delete_by_id(id)
                        .exec(txn)
                        .await
                        .context("delete customer")?;
                    if deleted.rows_affected == 0 {
                        return Ok(false);
                    }
                    writer
                        .write_event(
                            txn,
                            &CustomerDeleted {
                                customer_id: id,
                                deleted_at,
                            },
                        )
                        .await
                        .context("queue customer.deleted")?;
                    Ok(true)
                })
            })
            .await
            .map_err(from_txn_error)
    }
}

/// Insert a customer row on `conn` without queueing anything.
pub async fn insert_customer<C: ConnectionTrait>(
    conn: &C,
    customer: &Customer,
) -> Result<(), DbErr> {
    customers::ActiveModel {
        id: Set(customer.id),
        name: Set(customer.name.clone()),
        email: Set(customer.email.clone()),
        created_at: Set(customer.created_at),
        updated_at: Set(customer.updated_at),
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn email_in_use<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    except: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query = customers::Entity::find().filter(customers::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(customers::Column::Id.ne(id));
    }
    Ok(query.count(conn).await? > 0)
}

fn from_txn_error(err: TransactionError<CustomersServiceError>) -> CustomersServiceError {
    match err {
        TransactionError::Connection(e) => {
            CustomersServiceError::Internal(anyhow::Error::new(e).context("customer transaction"))
        }
        TransactionError::Transaction(e) => e,
    }
}

fn customer_from_model(m: customers::Model) -> Customer {
    Customer {
        id: m.id,
        name: m.name,
        email: m.email,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}
