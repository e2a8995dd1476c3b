use sea_orm::entity::prelude::*;

/// Local copy of a customer, maintained from customer events.
///
/// `version` is the timestamp of the last applied event. A deleted customer
/// keeps its row as a tombstone with `name`/`email` cleared so that late
/// deliveries of older events cannot bring it back.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "known_customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub customer_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub version: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
