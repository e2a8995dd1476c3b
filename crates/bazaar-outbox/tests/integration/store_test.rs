use std::time::Duration;

use chrono::Utc;

use bazaar_outbox::{OutboxStatus, OutboxStore};

use crate::helpers::{ids, seed, store};

const LEASE: Duration = Duration::from_secs(30);

fn secs(n: i64) -> chrono::Duration {
    chrono::Duration::seconds(n)
}

#[tokio::test]
async fn should_claim_in_id_order_and_count_attempt() {
    let store = store().await;
    let seeded = seed(&store.db, 3).await;

    let claimed = store.claim(10, LEASE, Utc::now()).await.unwrap();

    assert_eq!(ids(&claimed), seeded);
    for record in &claimed {
        assert_eq!(record.status, OutboxStatus::Publishing);
        assert_eq!(record.attempts, 1);
        assert!(record.claim_token.is_some());
        assert!(record.lease_expires_at.is_some());
    }
    assert_eq!(store.count_by_status(OutboxStatus::Publishing).await.unwrap(), 3);
}

#[tokio::test]
async fn should_respect_batch_size() {
    let store = store().await;
    let seeded = seed(&store.db, 5).await;

    let first = store.claim(2, LEASE, Utc::now()).await.unwrap();
    let second = store.claim(2, LEASE, Utc::now()).await.unwrap();

    assert_eq!(ids(&first), seeded[..2]);
    assert_eq!(ids(&second), seeded[2..4]);
}

/// The test database is a single-connection SQLite pool, so the two claims
/// run one after the other and this covers the conditional update only. The
/// `SKIP LOCKED` row locking is only taken on Postgres and is not exercised
/// here.
#[tokio::test]
async fn should_never_claim_a_record_twice_concurrently() {
    let store = store().await;
    let seeded = seed(&store.db, 6).await;
    let now = Utc::now();

    let (a, b) = tokio::join!(store.claim(4, LEASE, now), store.claim(4, LEASE, now));
    let (a, b) = (a.unwrap(), b.unwrap());

    let mut all = ids(&a);
    all.extend(ids(&b));
    all.sort();
    let before_dedup = all.len();
    all.dedup();
    assert_eq!(all.len(), before_dedup, "a record was claimed twice");
    assert_eq!(all, seeded);
}

#[tokio::test]
async fn should_reclaim_only_after_lease_expiry() {
    let store = store().await;
    seed(&store.db, 1).await;
    let t0 = Utc::now();

    let first = store.claim(10, LEASE, t0).await.unwrap();
    assert_eq!(first.len(), 1);

    let during_lease = store.claim(10, LEASE, t0 + secs(10)).await.unwrap();
    assert!(during_lease.is_empty());

    let after_lease = store.claim(10, LEASE, t0 + secs(31)).await.unwrap();
    assert_eq!(ids(&after_lease), ids(&first));
    assert_eq!(after_lease[0].attempts, 2);
    assert_ne!(after_lease[0].claim_token, first[0].claim_token);

    // The stale claim can no longer resolve the record.
    assert!(!store.mark_published(&first[0], t0 + secs(32)).await.unwrap());
    assert!(store.mark_published(&after_lease[0], t0 + secs(32)).await.unwrap());
}

#[tokio::test]
async fn should_mark_published() {
    let store = store().await;
    let id = seed(&store.db, 1).await[0];
    let now = Utc::now();
    let claimed = store.claim(1, LEASE, now).await.unwrap();

    assert!(store.mark_published(&claimed[0], now).await.unwrap());

    let record = store.find(id).await.unwrap().unwrap();
    assert_eq!(record.status, OutboxStatus::Published);
    assert!(record.published_at.is_some());
    assert!(record.claim_token.is_none());
    assert!(store.claim(1, LEASE, now + secs(3600)).await.unwrap().is_empty());
}

#[tokio::test]
async fn should_hold_retry_until_next_attempt_at() {
    let store = store().await;
    let id = seed(&store.db, 1).await[0];
    let t0 = Utc::now();
    let claimed = store.claim(1, LEASE, t0).await.unwrap();

    assert!(store
        .schedule_retry(&claimed[0], "broker unavailable", t0 + secs(60))
        .await
        .unwrap());

    let record = store.find(id).await.unwrap().unwrap();
    assert_eq!(record.status, OutboxStatus::Pending);
    assert_eq!(record.last_error.as_deref(), Some("broker unavailable"));
    assert_eq!(record.attempts, 1);

    assert!(store.claim(1, LEASE, t0 + secs(30)).await.unwrap().is_empty());
    let again = store.claim(1, LEASE, t0 + secs(61)).await.unwrap();
    assert_eq!(again[0].attempts, 2);
}

#[tokio::test]
async fn should_dead_letter_for_good() {
    let store = store().await;
    let id = seed(&store.db, 1).await[0];
    let now = Utc::now();
    let claimed = store.claim(1, LEASE, now).await.unwrap();

    assert!(store.mark_failed(&claimed[0], "malformed").await.unwrap());

    assert_eq!(store.find(id).await.unwrap().unwrap().status, OutboxStatus::Failed);
    assert!(store.claim(1, LEASE, now + secs(3600)).await.unwrap().is_empty());
}

#[tokio::test]
async fn should_release_without_counting_attempt() {
    let store = store().await;
    let id = seed(&store.db, 1).await[0];
    let now = Utc::now();
    let claimed = store.claim(1, LEASE, now).await.unwrap();

    assert!(store.release(&claimed[0]).await.unwrap());

    let record = store.find(id).await.unwrap().unwrap();
    assert_eq!(record.status, OutboxStatus::Pending);
    assert_eq!(record.attempts, 0);
    assert!(record.claim_token.is_none());
    assert_eq!(ids(&store.claim(1, LEASE, now).await.unwrap()), vec![id]);
}

#[tokio::test]
async fn should_purge_old_published_records_in_bounded_batches() {
    let store = store().await;
    let seeded = seed(&store.db, 4).await;
    let t0 = Utc::now();

    let claimed = store.claim(10, LEASE, t0).await.unwrap();
    for record in &claimed[..3] {
        store.mark_published(record, t0).await.unwrap();
    }

    // Too recent.
    assert_eq!(store.purge_published(t0 - secs(1), 10).await.unwrap(), 0);

    let cutoff = t0 + secs(1);
    assert_eq!(store.purge_published(cutoff, 2).await.unwrap(), 2);
    assert_eq!(store.purge_published(cutoff, 2).await.unwrap(), 1);
    assert_eq!(store.purge_published(cutoff, 2).await.unwrap(), 0);

    // The unpublished record is untouched.
    assert!(store.find(seeded[3]).await.unwrap().is_some());
    assert!(store.find(seeded[0]).await.unwrap().is_none());
}
