use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use bazaar_outbox::{DbOutboxStore, OutboxRecord, OutboxWriter};
use bazaar_testing::{db, fixture};

pub async fn store() -> DbOutboxStore {
    DbOutboxStore::new(db::outbox_db().await)
}

/// Commit `n` customer-created events, returning their ids.
pub async fn seed(db: &DatabaseConnection, n: usize) -> Vec<i64> {
    let txn = db.begin().await.unwrap();
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        let event = fixture::customer_created(Uuid::new_v4());
        ids.push(OutboxWriter::new().write_event(&txn, &event).await.unwrap());
    }
    txn.commit().await.unwrap();
    ids
}

pub fn ids(records: &[OutboxRecord]) -> Vec<i64> {
    records.iter().map(|r| r.id).collect()
}
