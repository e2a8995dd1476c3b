//! Transactional outbox: events are written in the same database transaction
//! as the business change they describe and drained to the bus by a polling
//! publisher.

pub mod config;
pub mod error;
pub mod outbox_events;
pub mod publisher;
pub mod record;
pub mod store;
mod time;
pub mod writer;

pub use config::PublisherConfig;
pub use error::OutboxError;
pub use publisher::{CycleReport, OutboxPublisher};
pub use record::{NewOutboxRecord, OutboxRecord, OutboxStatus};
pub use store::{DbOutboxStore, OutboxStore};
pub use writer::OutboxWriter;
