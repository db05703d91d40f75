//! Outbox persistence and lease tests against real backends

use domain_outbox::lease::{Lease, LeaseConfig, RedisLease};
use domain_outbox::postgres::{init_schema, PgOutboxRepository};
use domain_outbox::repository::{OutboxRepository, AGGREGATE_FOOD, EVENT_FOOD_DELETED};
use test_utils::{TestDatabase, TestRedis};

#[tokio::test]
#[ignore] // Requires Docker
async fn record_fetch_mark_roundtrip() {
    let db = TestDatabase::new().await;
    init_schema(&db.connection).await.unwrap();
    let repo = PgOutboxRepository::new(db.connection.clone());

    let first = repo
        .record(AGGREGATE_FOOD, "111", EVENT_FOOD_DELETED, None)
        .await
        .unwrap();
    let second = repo
        .record(AGGREGATE_FOOD, "222", EVENT_FOOD_DELETED, None)
        .await
        .unwrap();

    let events = repo.fetch_unprocessed(EVENT_FOOD_DELETED, 100).await.unwrap();
    assert_eq!(events.len(), 2);
    // Oldest first
    assert_eq!(events[0].id, first.id);
    assert_eq!(events[1].id, second.id);
    assert!(events.iter().all(|e| !e.processed));

    let marked = repo.mark_processed(&[first.id]).await.unwrap();
    assert_eq!(marked, 1);

    let remaining = repo.fetch_unprocessed(EVENT_FOOD_DELETED, 100).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn init_schema_is_idempotent() {
    let db = TestDatabase::new().await;
    init_schema(&db.connection).await.unwrap();
    init_schema(&db.connection).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Docker
async fn fetch_respects_event_type_and_limit() {
    let db = TestDatabase::new().await;
    init_schema(&db.connection).await.unwrap();
    let repo = PgOutboxRepository::new(db.connection.clone());

    for i in 0..5 {
        repo.record(AGGREGATE_FOOD, &i.to_string(), EVENT_FOOD_DELETED, None)
            .await
            .unwrap();
    }
    repo.record(AGGREGATE_FOOD, "999", "FOOD_CREATED", None)
        .await
        .unwrap();

    let events = repo.fetch_unprocessed(EVENT_FOOD_DELETED, 3).await.unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.event_type == EVENT_FOOD_DELETED));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn lease_is_mutually_exclusive() {
    let redis = TestRedis::new().await;
    let lease = RedisLease::new(redis.connection(), LeaseConfig::default());

    let token = lease.acquire("outbox_test").await.unwrap();
    assert!(token.is_some());

    // Second acquisition fails while held
    assert!(lease.acquire("outbox_test").await.unwrap().is_none());

    // A different lease name is independent
    assert!(lease.acquire("other").await.unwrap().is_some());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn released_lease_respects_min_hold() {
    let redis = TestRedis::new().await;
    let config = LeaseConfig {
        min_hold: std::time::Duration::from_millis(500),
        max_hold: std::time::Duration::from_secs(30),
    };
    let lease = RedisLease::new(redis.connection(), config);

    let token = lease.acquire("outbox_test").await.unwrap().unwrap();
    lease.release(token).await.unwrap();

    // Released before min_hold elapsed: key lingers and blocks reacquisition
    assert!(lease.acquire("outbox_test").await.unwrap().is_none());

    tokio::time::sleep(std::time::Duration::from_millis(700)).await;
    assert!(lease.acquire("outbox_test").await.unwrap().is_some());
}

#[tokio::test]
#[ignore] // Requires Docker
async fn stale_release_leaves_a_reacquired_lease_alone() {
    let redis = TestRedis::new().await;
    let config = LeaseConfig {
        min_hold: std::time::Duration::from_millis(1),
        max_hold: std::time::Duration::from_millis(200),
    };
    let lease = RedisLease::new(redis.connection(), config);

    let stale = lease.acquire("outbox_test").await.unwrap().unwrap();

    // Let the lease expire at max_hold, then have another replica take it
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    let current = lease.acquire("outbox_test").await.unwrap();
    assert!(current.is_some());

    // The stale holder's release must not destroy the new holder's lease
    lease.release(stale).await.unwrap();
    assert!(lease.acquire("outbox_test").await.unwrap().is_none());
}
