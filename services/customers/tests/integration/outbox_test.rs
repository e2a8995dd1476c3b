use std::sync::{Arc, Mutex};

use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, TransactionTrait};
use uuid::Uuid;

use bazaar_core::shutdown;
use bazaar_customers::domain::repository::CustomerRepository;
use bazaar_customers::error::CustomersServiceError;
use bazaar_customers::infra::db::{DbCustomerRepository, insert_customer};
use bazaar_customers::usecase::customer::{
    CreateCustomerInput, CreateCustomerUseCase, DeleteCustomerUseCase, UpdateCustomerInput,
    UpdateCustomerUseCase,
};
use bazaar_customers_schema::customers;
use bazaar_events::contracts::customer::{
    CUSTOMERS_TOPIC, CustomerCreated, CustomerDeleted, CustomerUpdated,
};
use bazaar_events::{Consumer, Event, HandlerRegistry};
use bazaar_outbox::{DbOutboxStore, OutboxPublisher, OutboxWriter, PublisherConfig};
use bazaar_testing::bus::ScriptedBus;
use bazaar_testing::db::outbox_rows;

use crate::helpers::{customers_db, test_customer, wait_until};

async fn customer_count(db: &DatabaseConnection) -> u64 {
    customers::Entity::find().count(db).await.unwrap()
}

fn event_types(rows: &[bazaar_outbox::outbox_events::Model]) -> Vec<&str> {
    rows.iter().map(|r| r.event_type.as_str()).collect()
}

#[tokio::test]
async fn should_queue_created_event_with_customer_row() {
    let db = customers_db().await;
    let repo = DbCustomerRepository::new(db.clone());
    let customer = test_customer();

    repo.create(&customer).await.unwrap();

    assert_eq!(customer_count(&db).await, 1);
    let rows = outbox_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].topic, CUSTOMERS_TOPIC);
    assert_eq!(rows[0].event_type, "customer.created");
    assert_eq!(rows[0].status, "pending");
    assert_eq!(rows[0].attempts, 0);

    let event = CustomerCreated::decode(&rows[0].payload).unwrap();
    assert_eq!(event.customer_id, customer.id);
    assert_eq!(event.email, customer.email);
    assert_eq!(event.created_at, customer.created_at);
}

#[tokio::test]
async fn should_queue_one_event_per_mutation_in_commit_order() {
    let db = customers_db().await;
    let repo = DbCustomerRepository::new(db.clone());
    let mut customer = test_customer();

    repo.create(&customer).await.unwrap();
    customer.name = "Ada King".to_owned();
    customer.updated_at = Utc::now();
    repo.update(&customer).await.unwrap();
    assert!(repo.delete(customer.id, Utc::now()).await.unwrap());

    let rows = outbox_rows(&db).await;
    assert_eq!(
        event_types(&rows),
        ["customer.created", "customer.updated", "customer.deleted"]
    );
    let updated = CustomerUpdated::decode(&rows[1].payload).unwrap();
    assert_eq!(updated.name, "Ada King");
    let deleted = CustomerDeleted::decode(&rows[2].payload).unwrap();
    assert_eq!(deleted.customer_id, customer.id);
    assert_eq!(customer_count(&db).await, 0);
}

#[tokio::test]
async fn should_leave_no_event_when_email_is_taken() {
    let db = customers_db().await;
    let repo = DbCustomerRepository::new(db.clone());
    let first = test_customer();
    let second = test_customer();
    repo.create(&first).await.unwrap();

    let result = repo.create(&second).await;

    assert!(
        matches!(result, Err(CustomersServiceError::EmailTaken)),
        "expected EmailTaken, got {result:?}"
    );
    assert_eq!(customer_count(&db).await, 1);
    assert_eq!(outbox_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn should_reject_update_to_another_customers_email() {
    let db = customers_db().await;
    let repo = DbCustomerRepository::new(db.clone());
    let first = test_customer();
    let mut second = test_customer();
    second.email = "grace@example.com".to_owned();
    repo.create(&first).await.unwrap();
    repo.create(&second).await.unwrap();

    second.email = first.email.clone();
    let result = repo.update(&second).await;

    assert!(matches!(result, Err(CustomersServiceError::EmailTaken)));
    assert_eq!(
        event_types(&outbox_rows(&db).await),
        ["customer.created", "customer.created"]
    );
}

#[tokio::test]
async fn should_not_queue_event_for_missing_customer() {
    let db = customers_db().await;
    let repo = DbCustomerRepository::new(db.clone());

    let deleted = repo.delete(Uuid::now_v7(), Utc::now()).await.unwrap();
    let updated = repo.update(&test_customer()).await;

    assert!(!deleted);
    assert!(matches!(updated, Err(CustomersServiceError::CustomerNotFound)));
    assert!(outbox_rows(&db).await.is_empty());
}

#[tokio::test]
async fn should_discard_row_and_event_together_on_rollback() {
    let db = customers_db().await;
    let customer = test_customer();

    let txn = db.begin().await.unwrap();
    insert_customer(&txn, &customer).await.unwrap();
    let event = CustomerCreated {
        customer_id: customer.id,
        name: customer.name.clone(),
        email: customer.email.clone(),
        created_at: customer.created_at,
    };
    OutboxWriter::new().write_event(&txn, &event).await.unwrap();
    txn.rollback().await.unwrap();

    assert_eq!(customer_count(&db).await, 0);
    assert!(outbox_rows(&db).await.is_empty());
}

#[tokio::test]
async fn should_deliver_committed_customer_events_to_subscribers() {
    let db = customers_db().await;
    let repo = DbCustomerRepository::new(db.clone());
    let bus = ScriptedBus::new();
    let log: Arc<Mutex<Vec<String>>> = Arc::default();

    let mut registry = HandlerRegistry::new();
    let created_log = Arc::clone(&log);
    registry
        .register::<CustomerCreated, _>(move |e: CustomerCreated| {
            let log = Arc::clone(&created_log);
            async move {
                log.lock().unwrap().push(format!("created {}", e.email));
                anyhow::Ok(())
            }
        })
        .unwrap();
    let updated_log = Arc::clone(&log);
    registry
        .register::<CustomerUpdated, _>(move |e: CustomerUpdated| {
            let log = Arc::clone(&updated_log);
            async move {
                log.lock().unwrap().push(format!("updated {}", e.email));
                anyhow::Ok(())
            }
        })
        .unwrap();
    let deleted_log = Arc::clone(&log);
    registry
        .register::<CustomerDeleted, _>(move |_: CustomerDeleted| {
            let log = Arc::clone(&deleted_log);
            async move {
                log.lock().unwrap().push("deleted".to_owned());
                anyhow::Ok(())
            }
        })
        .unwrap();

    let consumer = Consumer::new(registry.into_dispatcher());
    let (trigger, consumer_shutdown) = shutdown::channel();
    let consumer_bus = bus.clone();
    let consuming =
        tokio::spawn(async move { consumer.run(&consumer_bus, consumer_shutdown).await });
    wait_until(|| bus.inner().subscriber_count(CUSTOMERS_TOPIC) == 1).await;

    let customer = CreateCustomerUseCase { repo: repo.clone() }
        .execute(CreateCustomerInput {
            name: "Ada Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
        })
        .await
        .unwrap();
    UpdateCustomerUseCase { repo: repo.clone() }
        .execute(
            customer.id,
            UpdateCustomerInput {
                name: None,
                email: Some("ada.king@example.com".to_owned()),
            },
        )
        .await
        .unwrap();
    DeleteCustomerUseCase { repo: repo.clone() }
        .execute(customer.id)
        .await
        .unwrap();

    let publisher = OutboxPublisher::new(
        DbOutboxStore::new(db.clone()),
        bus.clone(),
        PublisherConfig::default(),
    )
    .unwrap();
    let (_publisher_trigger, publisher_shutdown) = shutdown::channel();
    let report = publisher.run_cycle(&publisher_shutdown).await.unwrap();
    assert_eq!(report.published, 3);

    wait_until(|| log.lock().unwrap().len() == 3).await;
    trigger.trigger();
    let stats = consuming.await.unwrap().unwrap();

    assert_eq!(stats.handled, 3);
    assert_eq!(
        *log.lock().unwrap(),
        [
            "created ada@example.com",
            "updated ada.king@example.com",
            "deleted"
        ]
    );
    assert!(outbox_rows(&db).await.iter().all(|r| r.status == "published"));
}
