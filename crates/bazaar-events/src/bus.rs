//! Transport abstraction: a dumb byte pipe keyed by topic and event type.
//!
//! Publishing returns once the broker has accepted the message. Subscribing
//! starts a background read loop for one topic which hands out one
//! [`Delivery`] at a time; the next one is only produced after the current one
//! has been settled, so handling is serial per topic and subscription.
//!
//! Delivery is at-least-once: a nacked (or dropped) delivery comes back later.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::contract::Event;
use crate::error::BusError;

/// A message as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub event_type: String,
    pub payload: Vec<u8>,
    /// Set when the transport knows this message was handed out before.
    pub redelivered: bool,
}

impl Message {
    pub fn new(topic: impl Into<String>, event_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            event_type: event_type.into(),
            payload,
            redelivered: false,
        }
    }
}

/// Outcome reported back to the transport for one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Done with it, never deliver again.
    Ack,
    /// Transient failure, deliver again later.
    Nack,
}

/// A received message awaiting settlement.
///
/// Dropping a delivery without settling it is the same as [`Delivery::nack`].
#[derive(Debug)]
pub struct Delivery {
    message: Message,
    settle: Option<oneshot::Sender<Settlement>>,
}

impl Delivery {
    pub fn new(message: Message, settle: oneshot::Sender<Settlement>) -> Self {
        Self {
            message,
            settle: Some(settle),
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn ack(self) {
        self.settle(Settlement::Ack);
    }

    pub fn nack(self) {
        self.settle(Settlement::Nack);
    }

    pub fn settle(mut self, settlement: Settlement) {
        if let Some(tx) = self.settle.take() {
            // The read loop may already be gone; redelivery is its problem then.
            let _ = tx.send(settlement);
        }
    }
}

/// Stream of deliveries for a single topic.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    rx: mpsc::Receiver<Delivery>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, rx: mpsc::Receiver<Delivery>) -> Self {
        Self {
            topic: topic.into(),
            rx,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next delivery. `None` once the transport has stopped.
    /// Cancel-safe.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }
}

/// Broker boundary used by the outbox publisher and by consumers.
pub trait EventBus: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        event_type: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), BusError>> + Send;

    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<Subscription, BusError>> + Send;
}

impl<B: EventBus> EventBus for Arc<B> {
    fn publish(
        &self,
        topic: &str,
        event_type: &str,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), BusError>> + Send {
        (**self).publish(topic, event_type, payload)
    }

    fn subscribe(&self, topic: &str) -> impl Future<Output = Result<Subscription, BusError>> + Send {
        (**self).subscribe(topic)
    }
}

/// Encode a typed event and publish it to its default topic, bypassing the
/// outbox. Only for events whose loss is acceptable.
pub async fn publish_event<B: EventBus, E: Event>(bus: &B, event: &E) -> Result<(), BusError> {
    let payload = event
        .encode()
        .map_err(|e| BusError::Malformed(format!("{e}")))?;
    bus.publish(E::TOPIC, E::EVENT_TYPE, &payload).await
}

pub(crate) fn validate_topic(topic: &str) -> Result<(), BusError> {
    if topic.trim().is_empty() {
        return Err(BusError::Malformed("empty topic".to_owned()));
    }
    Ok(())
}

pub(crate) fn validate_address(topic: &str, event_type: &str) -> Result<(), BusError> {
    validate_topic(topic)?;
    if event_type.trim().is_empty() {
        return Err(BusError::Malformed("empty event type".to_owned()));
    }
    Ok(())
}

/// Hand one message to the subscriber and wait for its settlement.
/// Returns `None` when the subscription has been dropped.
pub(crate) async fn hand_off(out: &mpsc::Sender<Delivery>, message: Message) -> Option<Settlement> {
    let (tx, rx) = oneshot::channel();
    out.send(Delivery::new(message, tx)).await.ok()?;
    Some(rx.await.unwrap_or(Settlement::Nack))
}
