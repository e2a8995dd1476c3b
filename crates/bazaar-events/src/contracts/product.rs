use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::Event;

pub const PRODUCTS_TOPIC: &str = "products";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: Uuid,
    pub sku: String,
    pub name: String,
    /// Unit price in minor currency units.
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Event for ProductCreated {
    const EVENT_TYPE: &'static str = "product.created";
    const TOPIC: &'static str = PRODUCTS_TOPIC;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdated {
    pub product_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub updated_at: DateTime<Utc>,
}

impl Event for ProductUpdated {
    const EVENT_TYPE: &'static str = "product.updated";
    const TOPIC: &'static str = PRODUCTS_TOPIC;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDeleted {
    pub product_id: Uuid,
    pub deleted_at: DateTime<Utc>,
}

impl Event for ProductDeleted {
    const EVENT_TYPE: &'static str = "product.deleted";
    const TOPIC: &'static str = PRODUCTS_TOPIC;
}
