//! Drives subscriptions into a [`Dispatcher`].
//!
//! One task per topic. Within a topic deliveries are handled one at a time and
//! settled according to the dispatch outcome: handled, unknown and malformed
//! messages are acked, handler failures are nacked for redelivery.

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use bazaar_core::shutdown::Shutdown;

use crate::bus::{EventBus, Subscription};
use crate::error::BusError;
use crate::redis::error_backoff;
use crate::registry::{Dispatcher, Disposition};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeStats {
    pub handled: u64,
    /// Unknown event types and undecodable payloads.
    pub skipped: u64,
    pub failed: u64,
}

impl ConsumeStats {
    fn record(&mut self, disposition: &Disposition) {
        match disposition {
            Disposition::Handled => self.handled += 1,
            Disposition::UnknownEventType | Disposition::Malformed(_) => self.skipped += 1,
            Disposition::Failed(_) => self.failed += 1,
        }
    }

    fn merge(&mut self, other: ConsumeStats) {
        self.handled += other.handled;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

pub struct Consumer {
    dispatcher: Dispatcher,
}

impl Consumer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Subscribe to every topic with a registered handler and consume until
    /// shutdown.
    ///
    /// Transient subscribe failures are retried with capped backoff until
    /// they succeed or shutdown is triggered. Fails only on an error retrying
    /// cannot fix, such as an invalid topic.
    pub async fn run<B: EventBus>(&self, bus: &B, shutdown: Shutdown) -> Result<ConsumeStats, BusError> {
        let mut subscriptions = Vec::new();
        for topic in self.dispatcher.topics() {
            match subscribe(bus, &topic, shutdown.clone()).await? {
                Some(subscription) => subscriptions.push(subscription),
                None => {
                    info!(topic = %topic, "shutdown before subscribing");
                    return Ok(ConsumeStats::default());
                }
            }
            info!(topic = %topic, "subscribed");
        }

        let mut tasks = JoinSet::new();
        for subscription in subscriptions {
            tasks.spawn(consume(subscription, self.dispatcher.clone(), shutdown.clone()));
        }

        let mut total = ConsumeStats::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(stats) => total.merge(stats),
                Err(e) => warn!(error = %e, "consumer task failed"),
            }
        }
        info!(
            handled = total.handled,
            skipped = total.skipped,
            failed = total.failed,
            "consumer stopped"
        );
        Ok(total)
    }
}

/// `None` when shutdown is triggered while still retrying.
async fn subscribe<B: EventBus>(
    bus: &B,
    topic: &str,
    mut shutdown: Shutdown,
) -> Result<Option<Subscription>, BusError> {
    let mut failures = 0u32;
    loop {
        if shutdown.is_triggered() {
            return Ok(None);
        }
        match bus.subscribe(topic).await {
            Ok(subscription) => return Ok(Some(subscription)),
            Err(e) if e.is_retryable() => {
                failures = failures.saturating_add(1);
                let delay = error_backoff(failures);
                warn!(
                    topic = %topic,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "subscribe failed"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = shutdown.triggered() => return Ok(None),
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Consume one subscription until shutdown or until the transport closes it.
/// A delivery that is already being handled is finished and settled before
/// shutdown is observed.
pub async fn consume(
    mut subscription: Subscription,
    dispatcher: Dispatcher,
    mut shutdown: Shutdown,
) -> ConsumeStats {
    let mut stats = ConsumeStats::default();
    loop {
        let delivery = tokio::select! {
            biased;
            _ = shutdown.triggered() => break,
            next = subscription.next() => match next {
                Some(delivery) => delivery,
                None => {
                    warn!(topic = %subscription.topic(), "subscription closed by transport");
                    break;
                }
            },
        };

        let disposition = dispatcher.dispatch(delivery.message()).await;
        stats.record(&disposition);
        debug!(
            topic = %subscription.topic(),
            event_type = %delivery.message().event_type,
            ack = disposition.should_ack(),
            "delivery settled"
        );
        delivery.settle(disposition.settlement());
    }
    stats
}
