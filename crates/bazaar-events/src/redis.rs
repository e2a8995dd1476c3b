//! Redis Streams transport.
//!
//! Each topic maps to one stream (`<prefix><topic>`). Every consuming service
//! reads through its own consumer group, so each service sees every message
//! once while instances of the same service share the load. Acked entries are
//! `XACK`ed; nacked entries stay pending and are picked up again with
//! `XAUTOCLAIM` once they have been idle for `claim_idle`.

use std::time::Duration;

use anyhow::Context;
use deadpool_redis::redis::{self, Value};
use deadpool_redis::{Pool, Runtime};
use tokio::sync::mpsc;

use bazaar_core::config;

use crate::bus::{self, EventBus, Message, Settlement, Subscription};
use crate::error::BusError;

const FIELD_EVENT_TYPE: &str = "event_type";
const FIELD_PAYLOAD: &str = "payload";
const MAX_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct RedisBusConfig {
    pub redis_url: String,
    pub stream_prefix: String,
    pub consumer_group: String,
    pub consumer_name: String,
    /// How long one `XREADGROUP` call blocks waiting for new entries.
    pub block: Duration,
    /// Pending entries idle for longer than this are reclaimed.
    pub claim_idle: Duration,
    /// Approximate stream length cap applied on publish.
    pub max_len: usize,
    pub read_count: usize,
}

impl RedisBusConfig {
    pub fn from_env(consumer_group: &str) -> Self {
        Self {
            redis_url: config::string_or("REDIS_URL", "redis://localhost:6379"),
            stream_prefix: config::string_or("EVENT_STREAM_PREFIX", "bazaar:events:"),
            consumer_group: config::string_or("EVENT_CONSUMER_GROUP", consumer_group),
            consumer_name: config::string_or(
                "EVENT_CONSUMER_NAME",
                &format!("{consumer_group}-{}", uuid::Uuid::new_v4()),
            ),
            block: config::millis_or("EVENT_READ_BLOCK_MS", Duration::from_secs(2)),
            claim_idle: config::millis_or("EVENT_CLAIM_IDLE_MS", Duration::from_secs(30)),
            max_len: config::parse_or("EVENT_STREAM_MAX_LEN", 100_000),
            read_count: config::parse_or("EVENT_READ_COUNT", 16),
        }
    }

    fn stream_key(&self, topic: &str) -> String {
        format!("{}{}", self.stream_prefix, topic)
    }
}

#[derive(Clone)]
pub struct RedisStreamBus {
    pool: Pool,
    config: RedisBusConfig,
}

impl RedisStreamBus {
    pub fn connect(config: RedisBusConfig) -> anyhow::Result<Self> {
        let pool = deadpool_redis::Config::from_url(&config.redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .context("failed to create redis pool")?;
        Ok(Self { pool, config })
    }

    pub fn with_pool(pool: Pool, config: RedisBusConfig) -> Self {
        Self { pool, config }
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, BusError> {
        self.pool
            .get()
            .await
            .map_err(|e| BusError::Unavailable(e.into()))
    }

    async fn ensure_group(&self, key: &str) -> Result<(), BusError> {
        let mut conn = self.connection().await?;
        let result: redis::RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(key)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(BusError::Unavailable(
                anyhow::Error::new(e).context(format!("XGROUP CREATE {key}")),
            )),
        }
    }
}

impl EventBus for RedisStreamBus {
    async fn publish(&self, topic: &str, event_type: &str, payload: &[u8]) -> Result<(), BusError> {
        bus::validate_address(topic, event_type)?;
        let key = self.config.stream_key(topic);
        let mut conn = self.connection().await?;

        let _: String = redis::cmd("XADD")
            .arg(&key)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.config.max_len)
            .arg("*")
            .arg(FIELD_EVENT_TYPE)
            .arg(event_type)
            .arg(FIELD_PAYLOAD)
            .arg(payload)
            .query_async(&mut conn)
            .await
            .map_err(|e| BusError::Unavailable(anyhow::Error::new(e).context(format!("XADD {key}"))))?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        bus::validate_topic(topic)?;
        let key = self.config.stream_key(topic);
        self.ensure_group(&key).await?;

        let (out_tx, out_rx) = mpsc::channel(1);
        tokio::spawn(read_loop(self.clone(), topic.to_owned(), key, out_tx));
        Ok(Subscription::new(topic, out_rx))
    }
}

/// A stream entry as read from Redis.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StreamEntry {
    id: String,
    event_type: Option<String>,
    payload: Option<Vec<u8>>,
}

async fn read_loop(bus: RedisStreamBus, topic: String, key: String, out: mpsc::Sender<bus::Delivery>) {
    let mut failures: u32 = 0;
    loop {
        if out.is_closed() {
            break;
        }
        match poll(&bus, &key).await {
            Ok((entries, redelivered)) => {
                failures = 0;
                for entry in entries {
                    if !deliver(&bus, &topic, &key, &out, entry, redelivered).await {
                        tracing::debug!(topic = %topic, "redis subscription closed");
                        return;
                    }
                }
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                let delay = error_backoff(failures);
                tracing::warn!(
                    topic = %topic,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "redis read failed"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = out.closed() => break,
                }
            }
        }
    }
    tracing::debug!(topic = %topic, "redis subscription closed");
}

/// Reclaimed entries first, then new ones. The flag tells whether the batch
/// was handed out before.
async fn poll(bus: &RedisStreamBus, key: &str) -> Result<(Vec<StreamEntry>, bool), BusError> {
    let mut conn = bus.connection().await?;
    let cfg = &bus.config;

    let claimed: Value = redis::cmd("XAUTOCLAIM")
        .arg(key)
        .arg(&cfg.consumer_group)
        .arg(&cfg.consumer_name)
        .arg(cfg.claim_idle.as_millis() as u64)
        .arg("0-0")
        .arg("COUNT")
        .arg(cfg.read_count)
        .query_async(&mut conn)
        .await
        .map_err(|e| BusError::Unavailable(anyhow::Error::new(e).context("XAUTOCLAIM")))?;
    let reclaimed = parse_autoclaim_reply(claimed);
    if !reclaimed.is_empty() {
        return Ok((reclaimed, true));
    }

    let fresh: Value = redis::cmd("XREADGROUP")
        .arg("GROUP")
        .arg(&cfg.consumer_group)
        .arg(&cfg.consumer_name)
        .arg("COUNT")
        .arg(cfg.read_count)
        .arg("BLOCK")
        .arg(cfg.block.as_millis() as u64)
        .arg("STREAMS")
        .arg(key)
        .arg(">")
        .query_async(&mut conn)
        .await
        .map_err(|e| BusError::Unavailable(anyhow::Error::new(e).context("XREADGROUP")))?;
    Ok((parse_read_reply(fresh), false))
}

/// Returns false once the subscription is gone.
async fn deliver(
    bus: &RedisStreamBus,
    topic: &str,
    key: &str,
    out: &mpsc::Sender<bus::Delivery>,
    entry: StreamEntry,
    redelivered: bool,
) -> bool {
    let (Some(event_type), Some(payload)) = (entry.event_type, entry.payload) else {
        tracing::warn!(topic = %topic, entry_id = %entry.id, "dropping stream entry without event fields");
        ack(bus, key, &entry.id).await;
        return true;
    };

    let message = Message {
        topic: topic.to_owned(),
        event_type,
        payload,
        redelivered,
    };
    match bus::hand_off(out, message).await {
        None => false,
        Some(Settlement::Ack) => {
            ack(bus, key, &entry.id).await;
            true
        }
        // Left pending; XAUTOCLAIM brings it back after claim_idle.
        Some(Settlement::Nack) => true,
    }
}

async fn ack(bus: &RedisStreamBus, key: &str, id: &str) {
    let result = async {
        let mut conn = bus.connection().await?;
        let _: i64 = redis::cmd("XACK")
            .arg(key)
            .arg(&bus.config.consumer_group)
            .arg(id)
            .query_async(&mut conn)
            .await
            .map_err(|e| BusError::Unavailable(e.into()))?;
        Ok::<_, BusError>(())
    }
    .await;

    if let Err(e) = result {
        // Not fatal: the entry will be reclaimed and delivered again.
        tracing::warn!(stream = %key, entry_id = %id, error = %e, "XACK failed");
    }
}

pub(crate) fn error_backoff(failures: u32) -> Duration {
    let exp = failures.saturating_sub(1).min(16);
    Duration::from_millis(100u64.saturating_mul(1 << exp)).min(MAX_ERROR_BACKOFF)
}

/// `XREADGROUP` reply: nil on timeout, else `[[key, [entry, ...]], ...]`.
fn parse_read_reply(value: Value) -> Vec<StreamEntry> {
    let Value::Array(streams) = value else {
        return Vec::new();
    };
    streams
        .into_iter()
        .filter_map(|stream| match stream {
            Value::Array(mut parts) if parts.len() == 2 => parts.pop(),
            _ => None,
        })
        .flat_map(parse_entries)
        .collect()
}

/// `XAUTOCLAIM` reply: `[next_cursor, [entry, ...], deleted_ids]`.
fn parse_autoclaim_reply(value: Value) -> Vec<StreamEntry> {
    match value {
        Value::Array(parts) => parts.into_iter().nth(1).map(parse_entries).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// `[[id, [field, value, ...]], ...]`; nil entries (deleted meanwhile) are skipped.
fn parse_entries(value: Value) -> Vec<StreamEntry> {
    let Value::Array(entries) = value else {
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| {
            let Value::Array(parts) = entry else {
                return None;
            };
            let mut parts = parts.into_iter();
            let id = string_of(parts.next()?)?;
            let mut parsed = StreamEntry {
                id,
                event_type: None,
                payload: None,
            };
            if let Some(Value::Array(fields)) = parts.next() {
                let mut fields = fields.into_iter();
                while let (Some(name), Some(value)) = (fields.next(), fields.next()) {
                    match string_of(name).as_deref() {
                        Some(FIELD_EVENT_TYPE) => parsed.event_type = string_of(value),
                        Some(FIELD_PAYLOAD) => parsed.payload = bytes_of(value),
                        _ => {}
                    }
                }
            }
            Some(parsed)
        })
        .collect()
}

fn bytes_of(value: Value) -> Option<Vec<u8>> {
    match value {
        Value::BulkString(bytes) => Some(bytes),
        Value::SimpleString(s) => Some(s.into_bytes()),
        _ => None,
    }
}

fn string_of(value: Value) -> Option<String> {
    bytes_of(value).and_then(|bytes| String::from_utf8(bytes).ok())
}
