//! Real SQL for storage tests: an in-memory SQLite database per test.

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityName, EntityTrait, Schema,
};

use bazaar_outbox::outbox_events;

/// Fresh, empty in-memory database. Panics if SQLite is unavailable.
///
/// Each SQLite connection has its own in-memory database, so the pool is
/// pinned to a single connection.
pub async fn memory() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(options)
        .await
        .expect("connect in-memory sqlite")
}

/// Create the table behind `entity`.
pub async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) {
    let backend = db.get_database_backend();
    let stmt = Schema::new(backend).create_table_from_entity(entity);
    db.execute(backend.build(&stmt))
        .await
        .unwrap_or_else(|e| panic!("create table {}: {e}", entity.table_name()));
}

/// In-memory database with the `outbox_events` table.
pub async fn outbox_db() -> DatabaseConnection {
    let db = memory().await;
    create_table(&db, outbox_events::Entity).await;
    db
}

/// Every outbox row, ordered by id.
pub async fn outbox_rows(db: &DatabaseConnection) -> Vec<outbox_events::Model> {
    use sea_orm::QueryOrder;

    outbox_events::Entity::find()
        .order_by_asc(outbox_events::Column::Id)
        .all(db)
        .await
        .expect("load outbox rows")
}
