//! Polling publisher draining the outbox to the bus.
//!
//! A cycle claims a batch, publishes records one at a time in ascending id
//! order and resolves each one right after its publish returns. Shutdown is
//! only checked between records: a publish in flight is finished and
//! resolved, records not yet started are released back to `pending` without
//! counting an attempt. Each publish has its own deadline
//! (`publish_timeout`) which is independent of shutdown.
//!
//! A publish is only started while the claim's lease outlives its deadline.
//! Once the lease can no longer cover one, the rest of the batch is released
//! the same way, so another publisher never reclaims a record this one is
//! still sending.

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use bazaar_core::shutdown::Shutdown;
use bazaar_events::{BusError, EventBus};

use crate::config::PublisherConfig;
use crate::error::OutboxError;
use crate::record::OutboxRecord;
use crate::store::OutboxStore;
use crate::time;

/// What one cycle did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub claimed: u64,
    pub published: u64,
    pub retried: u64,
    pub dead_lettered: u64,
    /// Handed back to `pending` because of shutdown or because the lease
    /// could not cover another publish.
    pub released: u64,
    /// Claims taken over by another publisher before they could be resolved.
    pub lost: u64,
    pub purged: u64,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

enum Resolution {
    Published,
    Retry(BusError),
    DeadLetter(BusError),
}

pub struct OutboxPublisher<S, B> {
    store: S,
    bus: B,
    config: PublisherConfig,
}

impl<S: OutboxStore, B: EventBus> OutboxPublisher<S, B> {
    pub fn new(store: S, bus: B, config: PublisherConfig) -> Result<Self, OutboxError> {
        config.validate()?;
        Ok(Self { store, bus, config })
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Run cycles on a fixed interval until shutdown. A failed cycle is
    /// logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: Shutdown) {
        let mut ticker = tokio::time::interval(self.config.process_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            batch_size = self.config.batch_size,
            interval_ms = self.config.process_interval.as_millis() as u64,
            max_retries = self.config.max_retries,
            "outbox publisher started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.triggered() => break,
                _ = ticker.tick() => {}
            }

            match self.run_cycle(&shutdown).await {
                Ok(report) if !report.is_empty() => info!(
                    claimed = report.claimed,
                    published = report.published,
                    retried = report.retried,
                    dead_lettered = report.dead_lettered,
                    released = report.released,
                    lost = report.lost,
                    purged = report.purged,
                    "outbox cycle finished"
                ),
                Ok(_) => {}
                Err(e) => error!(error = %e, kind = e.kind(), "outbox cycle aborted"),
            }
        }

        info!("outbox publisher stopped");
    }

    /// One claim/publish/resolve/cleanup pass. A storage error aborts the
    /// cycle; records still claimed by it become claimable again once their
    /// lease expires.
    pub async fn run_cycle(&self, shutdown: &Shutdown) -> Result<CycleReport, OutboxError> {
        let mut report = CycleReport::default();
        if shutdown.is_triggered() {
            return Ok(report);
        }

        let records = self
            .store
            .claim(self.config.batch_size, self.config.lease_duration, Utc::now())
            .await?;
        report.claimed = records.len() as u64;

        let mut records = records.into_iter();
        while let Some(record) = records.next() {
            let lease_left = self.lease_covers_publish(&record);
            if shutdown.is_triggered() || !lease_left {
                if !lease_left {
                    warn!(
                        record_id = record.id,
                        lease_expires_at = ?record.lease_expires_at,
                        "outbox lease too short for another publish, releasing rest of batch"
                    );
                }
                for record in std::iter::once(record).chain(records.by_ref()) {
                    self.release(&record, &mut report).await?;
                }
                break;
            }
            self.publish(record, &mut report).await?;
        }

        if !shutdown.is_triggered() {
            report.purged = self.purge().await?;
        }
        Ok(report)
    }

    async fn publish(&self, record: OutboxRecord, report: &mut CycleReport) -> Result<(), OutboxError> {
        let resolution = match self.try_publish(&record).await {
            Ok(()) => Resolution::Published,
            Err(e) if !e.is_retryable() => Resolution::DeadLetter(e),
            Err(e) if record.attempts >= self.max_attempts() => Resolution::DeadLetter(e),
            Err(e) => Resolution::Retry(e),
        };

        let now = Utc::now();
        let held = match &resolution {
            Resolution::Published => {
                let held = self.store.mark_published(&record, now).await?;
                if held {
                    report.published += 1;
                    debug!(record_id = record.id, topic = %record.topic, "outbox event published");
                }
                held
            }
            Resolution::Retry(e) => {
                let retry_at = time::add(now, self.config.retry_delay(record.attempts));
                let held = self
                    .store
                    .schedule_retry(&record, &e.to_string(), retry_at)
                    .await?;
                if held {
                    report.retried += 1;
                    warn!(
                        record_id = record.id,
                        topic = %record.topic,
                        event_type = %record.event_type,
                        attempts = record.attempts,
                        retry_at = %retry_at,
                        error = %e,
                        "outbox publish failed, will retry"
                    );
                }
                held
            }
            Resolution::DeadLetter(e) => {
                let held = self.store.mark_failed(&record, &e.to_string()).await?;
                if held {
                    report.dead_lettered += 1;
                    error!(
                        record_id = record.id,
                        topic = %record.topic,
                        event_type = %record.event_type,
                        attempts = record.attempts,
                        error = %e,
                        kind = e.kind(),
                        "outbox event dead-lettered"
                    );
                }
                held
            }
        };

        if !held {
            report.lost += 1;
            warn!(record_id = record.id, "outbox claim lost before resolve");
        }
        Ok(())
    }

    async fn try_publish(&self, record: &OutboxRecord) -> Result<(), BusError> {
        if record.topic.trim().is_empty() || record.event_type.trim().is_empty() {
            return Err(BusError::Malformed(
                "record has no topic or event type".to_owned(),
            ));
        }

        let publish = self
            .bus
            .publish(&record.topic, &record.event_type, &record.payload);
        match tokio::time::timeout(self.config.publish_timeout, publish).await {
            Ok(result) => result,
            Err(_) => Err(BusError::Unavailable(anyhow::anyhow!(
                "publish timed out after {} ms",
                self.config.publish_timeout.as_millis()
            ))),
        }
    }

    async fn release(&self, record: &OutboxRecord, report: &mut CycleReport) -> Result<(), OutboxError> {
        if self.store.release(record).await? {
            report.released += 1;
            debug!(record_id = record.id, "outbox claim released");
        } else {
            report.lost += 1;
            warn!(record_id = record.id, "outbox claim lost before release");
        }
        Ok(())
    }

    /// Whether a publish started now would hit its deadline before the lease
    /// expires.
    fn lease_covers_publish(&self, record: &OutboxRecord) -> bool {
        record
            .lease_expires_at
            .is_none_or(|expires| time::add(Utc::now(), self.config.publish_timeout) < expires)
    }

    async fn purge(&self) -> Result<u64, OutboxError> {
        if self.config.delete_batch_size == 0 {
            return Ok(0);
        }
        let cutoff = time::sub(Utc::now(), self.config.retention);
        self.store
            .purge_published(cutoff, self.config.delete_batch_size)
            .await
    }

    fn max_attempts(&self) -> i32 {
        i32::try_from(self.config.max_retries).unwrap_or(i32::MAX)
    }
}
