use sea_orm::entity::prelude::*;

/// Outbox row: one event awaiting or having undergone delivery.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "outbox_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub event_type: String,
    pub topic: String,
    pub payload: Vec<u8>,
    /// `pending`, `publishing`, `published` or `failed`.
    pub status: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    /// Claim cycle currently holding the row, set while `publishing`.
    pub claim_token: Option<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub next_attempt_at: chrono::DateTime<chrono::Utc>,
    pub lease_expires_at: Option<chrono::DateTime<chrono::Utc>>,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
