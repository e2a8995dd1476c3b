use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use bazaar_products::domain::repository::KnownCustomerRepository;
use bazaar_products::domain::types::SyncOutcome;
use bazaar_products_schema::known_customers;
use bazaar_testing::fixture::{at, customer_created, customer_deleted, customer_updated};

use crate::helpers::sync;

#[tokio::test]
async fn should_apply_created_event_once() {
    let (usecase, repo) = sync().await;
    let id = Uuid::new_v4();

    let first = usecase.created(customer_created(id)).await.unwrap();
    let again = usecase.created(customer_created(id)).await.unwrap();

    assert_eq!(first, SyncOutcome::Applied);
    assert_eq!(again, SyncOutcome::Stale);
    let stored = repo.find(id).await.unwrap().unwrap();
    assert_eq!(stored.email, "ada@example.com");
    assert_eq!(stored.version, at(12, 0, 0));
    assert_eq!(known_customers::Entity::find().count(&repo.db).await.unwrap(), 1);
}

#[tokio::test]
async fn should_ignore_update_older_than_stored_state() {
    let (usecase, repo) = sync().await;
    let id = Uuid::new_v4();
    usecase.created(customer_created(id)).await.unwrap();
    usecase
        .updated(customer_updated(id, at(12, 10, 0)))
        .await
        .unwrap();

    let mut late = customer_updated(id, at(12, 5, 0));
    late.name = "Outdated".to_owned();
    let outcome = usecase.updated(late).await.unwrap();

    assert_eq!(outcome, SyncOutcome::Stale);
    let stored = repo.find(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Ada King");
    assert_eq!(stored.version, at(12, 10, 0));
}

#[tokio::test]
async fn should_insert_customer_from_update_that_overtook_create() {
    let (usecase, repo) = sync().await;
    let id = Uuid::new_v4();

    usecase
        .updated(customer_updated(id, at(12, 5, 0)))
        .await
        .unwrap();
    let created = usecase.created(customer_created(id)).await.unwrap();

    assert_eq!(created, SyncOutcome::Stale);
    let stored = repo.find(id).await.unwrap().unwrap();
    assert_eq!(stored.email, "ada.king@example.com");
}

#[tokio::test]
async fn should_keep_deleted_customer_deleted_when_old_events_arrive_late() {
    let (usecase, repo) = sync().await;
    let id = Uuid::new_v4();
    usecase.created(customer_created(id)).await.unwrap();

    let deleted = usecase
        .deleted(customer_deleted(id, at(13, 0, 0)))
        .await
        .unwrap();
    let late = usecase
        .updated(customer_updated(id, at(12, 30, 0)))
        .await
        .unwrap();

    assert_eq!(deleted, SyncOutcome::Applied);
    assert_eq!(late, SyncOutcome::Stale);
    assert_eq!(repo.find(id).await.unwrap(), None);

    let tombstone = known_customers::Entity::find_by_id(id)
        .one(&repo.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tombstone.name, None);
    assert_eq!(tombstone.email, None);
    assert_eq!(tombstone.deleted_at, Some(at(13, 0, 0)));
}

#[tokio::test]
async fn should_tombstone_customer_never_seen() {
    let (usecase, repo) = sync().await;
    let id = Uuid::new_v4();

    let deleted = usecase
        .deleted(customer_deleted(id, at(13, 0, 0)))
        .await
        .unwrap();
    let created = usecase.created(customer_created(id)).await.unwrap();

    assert_eq!(deleted, SyncOutcome::Applied);
    assert_eq!(created, SyncOutcome::Stale);
    assert_eq!(repo.find(id).await.unwrap(), None);
}
