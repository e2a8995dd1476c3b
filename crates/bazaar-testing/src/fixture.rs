//! Event fixtures with fixed, readable values.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use bazaar_events::contracts::customer::{CustomerCreated, CustomerDeleted, CustomerUpdated};

pub fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, hour, min, sec)
        .single()
        .expect("valid fixture time")
}

pub fn customer_created(customer_id: Uuid) -> CustomerCreated {
    CustomerCreated {
        customer_id,
        name: "Ada Lovelace".to_owned(),
        email: "ada@example.com".to_owned(),
        created_at: at(12, 0, 0),
    }
}

pub fn customer_updated(customer_id: Uuid, updated_at: DateTime<Utc>) -> CustomerUpdated {
    CustomerUpdated {
        customer_id,
        name: "Ada King".to_owned(),
        email: "ada.king@example.com".to_owned(),
        updated_at,
    }
}

pub fn customer_deleted(customer_id: Uuid, deleted_at: DateTime<Utc>) -> CustomerDeleted {
    CustomerDeleted {
        customer_id,
        deleted_at,
    }
}
