use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, LockBehavior, LockType};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::error::OutboxError;
use crate::outbox_events::{self, Column, Entity};
use crate::record::{OutboxRecord, OutboxStatus};
use crate::time;

/// Durable outbox table as used by the publisher.
///
/// Every resolve call is conditional on the record still being held by the
/// claim that produced it and returns `false` when it no longer is (the lease
/// expired and another publisher took the record over).
pub trait OutboxStore: Send + Sync {
    /// Claim up to `limit` due records in ascending id order, moving them to
    /// `publishing` under a fresh claim token and counting one attempt each.
    fn claim(
        &self,
        limit: u64,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<OutboxRecord>, OutboxError>> + Send;

    fn mark_published(
        &self,
        record: &OutboxRecord,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, OutboxError>> + Send;

    /// Back to `pending`, not claimable before `next_attempt_at`.
    fn schedule_retry(
        &self,
        record: &OutboxRecord,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, OutboxError>> + Send;

    /// Dead-letter the record.
    fn mark_failed(
        &self,
        record: &OutboxRecord,
        error: &str,
    ) -> impl Future<Output = Result<bool, OutboxError>> + Send;

    /// Undo a claim without counting it as an attempt.
    fn release(&self, record: &OutboxRecord) -> impl Future<Output = Result<bool, OutboxError>> + Send;

    /// Delete at most `limit` records published before `older_than`.
    fn purge_published(
        &self,
        older_than: DateTime<Utc>,
        limit: u64,
    ) -> impl Future<Output = Result<u64, OutboxError>> + Send;
}

#[derive(Clone)]
pub struct DbOutboxStore {
    pub db: DatabaseConnection,
}

impl DbOutboxStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, id: i64) -> Result<Option<OutboxRecord>, OutboxError> {
        let model = Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find outbox event")?;
        model.map(to_record).transpose()
    }

    pub async fn count_by_status(&self, status: OutboxStatus) -> Result<u64, OutboxError> {
        let count = Entity::find()
            .filter(Column::Status.eq(status.as_str()))
            .count(&self.db)
            .await
            .context("count outbox events")?;
        Ok(count)
    }

    async fn resolve(
        &self,
        record: &OutboxRecord,
        update: sea_orm::UpdateMany<Entity>,
        action: &'static str,
    ) -> Result<bool, OutboxError> {
        let Some(token) = record.claim_token else {
            return Ok(false);
        };
        let result = update
            .col_expr(Column::ClaimToken, Expr::value(Option::<Uuid>::None))
            .col_expr(Column::LeaseExpiresAt, Expr::value(Option::<DateTime<Utc>>::None))
            .filter(Column::Id.eq(record.id))
            .filter(Column::ClaimToken.eq(token))
            .filter(Column::Status.eq(OutboxStatus::Publishing.as_str()))
            .exec(&self.db)
            .await
            .with_context(|| format!("{action} outbox event {}", record.id))?;
        Ok(result.rows_affected == 1)
    }
}

/// Due pending records, plus publishing records whose lease ran out.
fn claimable(now: DateTime<Utc>) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(Column::Status.eq(OutboxStatus::Pending.as_str()))
                .add(Column::NextAttemptAt.lte(now)),
        )
        .add(
            Condition::all()
                .add(Column::Status.eq(OutboxStatus::Publishing.as_str()))
                .add(Column::LeaseExpiresAt.lt(now)),
        )
}

fn to_record(model: outbox_events::Model) -> Result<OutboxRecord, OutboxError> {
    let id = model.id;
    let record = OutboxRecord::try_from(model).with_context(|| format!("read outbox event {id}"))?;
    Ok(record)
}

impl OutboxStore for DbOutboxStore {
    async fn claim(
        &self,
        limit: u64,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<OutboxRecord>, OutboxError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let token = Uuid::new_v4();
        let txn = self.db.begin().await.context("begin outbox claim")?;

        let mut candidates = Entity::find()
            .select_only()
            .column(Column::Id)
            .filter(claimable(now))
            .order_by_asc(Column::Id)
            .limit(limit);
        // SQLite serializes writers; the conditional update below is enough there.
        if txn.get_database_backend() != DatabaseBackend::Sqlite {
            candidates = candidates.lock_with_behavior(LockType::Update, LockBehavior::SkipLocked);
        }
        let ids: Vec<i64> = candidates
            .into_tuple()
            .all(&txn)
            .await
            .context("select claimable outbox events")?;

        if ids.is_empty() {
            txn.commit().await.context("commit empty outbox claim")?;
            return Ok(Vec::new());
        }

        Entity::update_many()
            .col_expr(Column::Status, Expr::value(OutboxStatus::Publishing.as_str()))
            .col_expr(Column::ClaimToken, Expr::value(token))
            .col_expr(Column::LeaseExpiresAt, Expr::value(time::add(now, lease)))
            .col_expr(Column::Attempts, Expr::col(Column::Attempts).add(1))
            .filter(Column::Id.is_in(ids))
            .filter(claimable(now))
            .exec(&txn)
            .await
            .context("claim outbox events")?;

        let claimed = Entity::find()
            .filter(Column::ClaimToken.eq(token))
            .order_by_asc(Column::Id)
            .all(&txn)
            .await
            .context("load claimed outbox events")?;
        txn.commit().await.context("commit outbox claim")?;

        claimed.into_iter().map(to_record).collect()
    }

    async fn mark_published(&self, record: &OutboxRecord, now: DateTime<Utc>) -> Result<bool, OutboxError> {
        let update = Entity::update_many()
            .col_expr(Column::Status, Expr::value(OutboxStatus::Published.as_str()))
            .col_expr(Column::PublishedAt, Expr::value(now));
        self.resolve(record, update, "publish").await
    }

    async fn schedule_retry(
        &self,
        record: &OutboxRecord,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<bool, OutboxError> {
        let update = Entity::update_many()
            .col_expr(Column::Status, Expr::value(OutboxStatus::Pending.as_str()))
            .col_expr(Column::LastError, Expr::value(error))
            .col_expr(Column::NextAttemptAt, Expr::value(next_attempt_at));
        self.resolve(record, update, "retry").await
    }

    async fn mark_failed(&self, record: &OutboxRecord, error: &str) -> Result<bool, OutboxError> {
        let update = Entity::update_many()
            .col_expr(Column::Status, Expr::value(OutboxStatus::Failed.as_str()))
            .col_expr(Column::LastError, Expr::value(error));
        self.resolve(record, update, "dead-letter").await
    }

    async fn release(&self, record: &OutboxRecord) -> Result<bool, OutboxError> {
        let update = Entity::update_many()
            .col_expr(Column::Status, Expr::value(OutboxStatus::Pending.as_str()))
            .col_expr(Column::Attempts, Expr::col(Column::Attempts).sub(1));
        self.resolve(record, update, "release").await
    }

    async fn purge_published(&self, older_than: DateTime<Utc>, limit: u64) -> Result<u64, OutboxError> {
        if limit == 0 {
            return Ok(0);
        }
        let ids: Vec<i64> = Entity::find()
            .select_only()
            .column(Column::Id)
            .filter(Column::Status.eq(OutboxStatus::Published.as_str()))
            .filter(Column::PublishedAt.lt(older_than))
            .order_by_asc(Column::Id)
            .limit(limit)
            .into_tuple()
            .all(&self.db)
            .await
            .context("select purgeable outbox events")?;
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Entity::delete_many()
            .filter(Column::Id.is_in(ids))
            .filter(Column::Status.eq(OutboxStatus::Published.as_str()))
            .exec(&self.db)
            .await
            .context("purge published outbox events")?;
        Ok(result.rows_affected)
    }
}

