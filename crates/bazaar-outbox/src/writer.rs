use anyhow::Context;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, DatabaseTransaction, Set};

use bazaar_events::Event;

use crate::error::OutboxError;
use crate::outbox_events;
use crate::record::{NewOutboxRecord, OutboxStatus};

/// Appends events to the outbox inside the caller's transaction.
///
/// The writer never talks to the bus. Whatever the caller does with the
/// transaction (commit or rollback) applies to the event as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutboxWriter;

impl OutboxWriter {
    pub fn new() -> Self {
        Self
    }

    /// Serialize `event` and queue it for its default topic. Returns the new
    /// record id.
    pub async fn write_event<E: Event>(
        &self,
        txn: &DatabaseTransaction,
        event: &E,
    ) -> Result<i64, OutboxError> {
        self.write_event_to(txn, E::TOPIC, event).await
    }

    /// Like [`OutboxWriter::write_event`] with an explicit topic.
    pub async fn write_event_to<E: Event>(
        &self,
        txn: &DatabaseTransaction,
        topic: &str,
        event: &E,
    ) -> Result<i64, OutboxError> {
        let payload = event.encode()?;
        self.write_raw(
            txn,
            NewOutboxRecord {
                event_type: E::EVENT_TYPE.to_owned(),
                topic: topic.to_owned(),
                payload,
            },
        )
        .await
    }

    /// Queue an already-serialized payload.
    pub async fn write_raw(
        &self,
        txn: &DatabaseTransaction,
        record: NewOutboxRecord,
    ) -> Result<i64, OutboxError> {
        if record.topic.trim().is_empty() {
            return Err(OutboxError::InvalidArgument("topic must not be empty".into()));
        }
        if record.event_type.trim().is_empty() {
            return Err(OutboxError::InvalidArgument(
                "event type must not be empty".into(),
            ));
        }

        let now = Utc::now();
        let model = outbox_events::ActiveModel {
            id: NotSet,
            event_type: Set(record.event_type),
            topic: Set(record.topic),
            payload: Set(record.payload),
            status: Set(OutboxStatus::Pending.as_str().to_owned()),
            attempts: Set(0),
            last_error: Set(None),
            claim_token: Set(None),
            created_at: Set(now),
            next_attempt_at: Set(now),
            lease_expires_at: Set(None),
            published_at: Set(None),
        }
        .insert(txn)
        .await
        .context("insert outbox event")?;

        tracing::debug!(record_id = model.id, event_type = %model.event_type, "outbox event queued");
        Ok(model.id)
    }
}
