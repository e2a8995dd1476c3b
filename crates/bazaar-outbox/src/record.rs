use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::outbox_events;

/// Delivery state of an outbox record.
///
/// `Pending -> Publishing -> {Published | Pending | Failed}`; `Published` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboxStatus {
    Pending,
    Publishing,
    Published,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Publishing => "publishing",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Published | Self::Failed)
    }
}

impl fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown outbox status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OutboxStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "publishing" => Ok(Self::Publishing),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// An outbox row as seen by the publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboxRecord {
    pub id: i64,
    pub event_type: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub status: OutboxStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub claim_token: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub next_attempt_at: DateTime<Utc>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
}

impl TryFrom<outbox_events::Model> for OutboxRecord {
    type Error = UnknownStatus;

    fn try_from(model: outbox_events::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            status: model.status.parse()?,
            event_type: model.event_type,
            topic: model.topic,
            payload: model.payload,
            attempts: model.attempts,
            last_error: model.last_error,
            claim_token: model.claim_token,
            created_at: model.created_at,
            next_attempt_at: model.next_attempt_at,
            lease_expires_at: model.lease_expires_at,
            published_at: model.published_at,
        })
    }
}

/// An already-serialized event to append to the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutboxRecord {
    pub event_type: String,
    pub topic: String,
    pub payload: Vec<u8>,
}
