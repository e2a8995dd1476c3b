//! Event contracts and the pub/sub side of the Bazaar event pipeline.
//!
//! Producers serialize [`Event`] values into bytes; transports implementing
//! [`EventBus`] move those bytes around keyed by topic and event type; consumers
//! build a [`HandlerRegistry`] at startup, freeze it into a [`Dispatcher`] and
//! hand it to a [`Consumer`], which turns deliveries back into typed events.

pub mod bus;
pub mod consumer;
pub mod contract;
pub mod contracts;
pub mod error;
pub mod memory;
pub mod redis;
pub mod registry;

pub use bus::{Delivery, EventBus, Message, Settlement, Subscription, publish_event};
pub use consumer::{ConsumeStats, Consumer};
pub use contract::Event;
pub use error::{BusError, EventError, RegistryError};
pub use memory::InMemoryBus;
pub use redis::{RedisBusConfig, RedisStreamBus};
pub use registry::{Dispatcher, Disposition, EventHandler, HandlerRegistry};
