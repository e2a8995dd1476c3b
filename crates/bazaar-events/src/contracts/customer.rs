use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::Event;

pub const CUSTOMERS_TOPIC: &str = "customers";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCreated {
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Event for CustomerCreated {
    const EVENT_TYPE: &'static str = "customer.created";
    const TOPIC: &'static str = CUSTOMERS_TOPIC;
}

/// Carries the full post-update state so consumers can upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdated {
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

impl Event for CustomerUpdated {
    const EVENT_TYPE: &'static str = "customer.updated";
    const TOPIC: &'static str = CUSTOMERS_TOPIC;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDeleted {
    pub customer_id: Uuid,
    pub deleted_at: DateTime<Utc>,
}

impl Event for CustomerDeleted {
    const EVENT_TYPE: &'static str = "customer.deleted";
    const TOPIC: &'static str = CUSTOMERS_TOPIC;
}
