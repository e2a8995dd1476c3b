use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A customer as this service knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownCustomer {
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    /// Timestamp of the customer event this state comes from.
    pub version: DateTime<Utc>,
}

/// Whether an incoming event changed local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    /// Same or older than what is stored: a redelivery or an out-of-order event.
    Stale,
}

impl SyncOutcome {
    pub fn from_applied(applied: bool) -> Self {
        if applied { Self::Applied } else { Self::Stale }
    }
}
