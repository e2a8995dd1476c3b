//! In-process bus used by tests and single-binary setups.
//!
//! Every subscriber of a topic receives every message published to it after
//! it subscribed. Nacked deliveries are requeued after a short delay and
//! flagged as redelivered. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::bus::{self, EventBus, Message, Settlement, Subscription};
use crate::error::BusError;

const DEFAULT_REDELIVERY_DELAY: Duration = Duration::from_millis(10);

#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

struct Inner {
    topics: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Message>>>>,
    redelivery_delay: Duration,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::with_redelivery_delay(DEFAULT_REDELIVERY_DELAY)
    }

    pub fn with_redelivery_delay(redelivery_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                topics: Mutex::new(HashMap::new()),
                redelivery_delay,
            }),
        }
    }

    /// Live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .lock()
            .map(|topics| {
                topics
                    .get(topic)
                    .map(|subs| subs.iter().filter(|s| !s.is_closed()).count())
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    fn fan_out(&self, message: Message) -> Result<(), BusError> {
        let mut topics = self.inner.topics.lock().map_err(|_| BusError::Closed)?;
        if let Some(subs) = topics.get_mut(&message.topic) {
            subs.retain(|sub| sub.send(message.clone()).is_ok());
        }
        Ok(())
    }
}

impl EventBus for InMemoryBus {
    async fn publish(&self, topic: &str, event_type: &str, payload: &[u8]) -> Result<(), BusError> {
        bus::validate_address(topic, event_type)?;
        self.fan_out(Message::new(topic, event_type, payload.to_vec()))
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        bus::validate_topic(topic)?;

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        self.inner
            .topics
            .lock()
            .map_err(|_| BusError::Closed)?
            .entry(topic.to_owned())
            .or_default()
            .push(queue_tx.clone());

        let (out_tx, out_rx) = mpsc::channel(1);
        tokio::spawn(pump(
            queue_tx,
            queue_rx,
            out_tx,
            self.inner.redelivery_delay,
        ));

        Ok(Subscription::new(topic, out_rx))
    }
}

/// Feeds one subscription, one delivery at a time, until it is dropped.
async fn pump(
    requeue: mpsc::UnboundedSender<Message>,
    mut queue: mpsc::UnboundedReceiver<Message>,
    out: mpsc::Sender<bus::Delivery>,
    redelivery_delay: Duration,
) {
    loop {
        let message = tokio::select! {
            message = queue.recv() => match message {
                Some(message) => message,
                None => break,
            },
            _ = out.closed() => break,
        };

        match bus::hand_off(&out, message.clone()).await {
            None => break,
            Some(Settlement::Ack) => {}
            Some(Settlement::Nack) => {
                tokio::time::sleep(redelivery_delay).await;
                let message = Message {
                    redelivered: true,
                    ..message
                };
                if requeue.send(message).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("in-memory subscription closed");
}
