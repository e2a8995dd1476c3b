use std::time::Duration;

use bazaar_core::config;

use crate::error::OutboxError;

/// Outbox publisher tuning, loaded from `OUTBOX_*` environment variables.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Records claimed per cycle. Env var: `OUTBOX_BATCH_SIZE`.
    pub batch_size: u64,
    /// Published records purged per cycle, 0 disables cleanup.
    /// Env var: `OUTBOX_DELETE_BATCH_SIZE`.
    pub delete_batch_size: u64,
    /// Env var: `OUTBOX_PROCESS_INTERVAL_MS`.
    pub process_interval: Duration,
    /// Claims a record may go through before it is dead-lettered.
    /// Env var: `OUTBOX_MAX_RETRIES`.
    pub max_retries: u32,
    /// How long a claim stays exclusive, must exceed `publish_timeout`.
    /// Env var: `OUTBOX_LEASE_MS`.
    pub lease_duration: Duration,
    /// Deadline for a single bus publish. Env var: `OUTBOX_PUBLISH_TIMEOUT_MS`.
    pub publish_timeout: Duration,
    /// Env var: `OUTBOX_RETRY_BACKOFF_MS`.
    pub retry_backoff_base: Duration,
    /// Env var: `OUTBOX_RETRY_BACKOFF_MAX_MS`.
    pub retry_backoff_max: Duration,
    /// Age after which published records may be purged.
    /// Env var: `OUTBOX_RETENTION_SECS`.
    pub retention: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            delete_batch_size: 500,
            process_interval: Duration::from_secs(1),
            max_retries: 5,
            lease_duration: Duration::from_secs(30),
            publish_timeout: Duration::from_secs(5),
            retry_backoff_base: Duration::from_millis(500),
            retry_backoff_max: Duration::from_secs(60),
            retention: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

impl PublisherConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            batch_size: config::parse_or("OUTBOX_BATCH_SIZE", d.batch_size),
            delete_batch_size: config::parse_or("OUTBOX_DELETE_BATCH_SIZE", d.delete_batch_size),
            process_interval: config::millis_or("OUTBOX_PROCESS_INTERVAL_MS", d.process_interval),
            max_retries: config::parse_or("OUTBOX_MAX_RETRIES", d.max_retries),
            lease_duration: config::millis_or("OUTBOX_LEASE_MS", d.lease_duration),
            publish_timeout: config::millis_or("OUTBOX_PUBLISH_TIMEOUT_MS", d.publish_timeout),
            retry_backoff_base: config::millis_or("OUTBOX_RETRY_BACKOFF_MS", d.retry_backoff_base),
            retry_backoff_max: config::millis_or("OUTBOX_RETRY_BACKOFF_MAX_MS", d.retry_backoff_max),
            retention: config::secs_or("OUTBOX_RETENTION_SECS", d.retention),
        }
    }

    pub fn validate(&self) -> Result<(), OutboxError> {
        if self.batch_size == 0 {
            return Err(OutboxError::InvalidArgument("batch_size must be positive".into()));
        }
        if self.max_retries == 0 {
            return Err(OutboxError::InvalidArgument("max_retries must be positive".into()));
        }
        if self.lease_duration.is_zero() {
            return Err(OutboxError::InvalidArgument("lease_duration must be positive".into()));
        }
        if self.lease_duration <= self.publish_timeout {
            return Err(OutboxError::InvalidArgument(
                "lease_duration must exceed publish_timeout".into(),
            ));
        }
        if self.process_interval.is_zero() {
            return Err(OutboxError::InvalidArgument("process_interval must be positive".into()));
        }
        Ok(())
    }

    /// Delay before the next claim of a record that has failed `attempts` times.
    pub fn retry_delay(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).clamp(0, 30) as u32;
        self.retry_backoff_base
            .saturating_mul(1u32 << exponent)
            .min(self.retry_backoff_max)
    }
}
