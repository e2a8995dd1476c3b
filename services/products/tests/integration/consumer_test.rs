use uuid::Uuid;

use bazaar_core::shutdown;
use bazaar_events::{Consumer, EventBus, InMemoryBus, publish_event};
use bazaar_events::contracts::customer::CUSTOMERS_TOPIC;
use bazaar_products::domain::repository::KnownCustomerRepository;
use bazaar_products::handlers::events::customer_registry;
use bazaar_products::infra::db::DbKnownCustomerRepository;
use bazaar_testing::fixture::{at, customer_created, customer_updated};

use crate::helpers::{directory_db, eventually};

#[tokio::test]
async fn should_register_every_customer_event() {
    let repo = DbKnownCustomerRepository::new(directory_db().await);

    let registry = customer_registry(repo).unwrap();

    assert_eq!(registry.topics(), [CUSTOMERS_TOPIC]);
    assert_eq!(registry.len(), 3);
    let dispatcher = registry.into_dispatcher();
    for event_type in ["customer.created", "customer.updated", "customer.deleted"] {
        assert!(dispatcher.handles(CUSTOMERS_TOPIC, event_type), "{event_type}");
    }
}

#[tokio::test]
async fn should_sync_directory_from_bus_and_skip_unusable_messages() {
    let repo = DbKnownCustomerRepository::new(directory_db().await);
    let bus = InMemoryBus::new();
    let consumer = Consumer::new(customer_registry(repo.clone()).unwrap().into_dispatcher());
    let (trigger, consumer_shutdown) = shutdown::channel();
    let consumer_bus = bus.clone();
    let consuming =
        tokio::spawn(async move { consumer.run(&consumer_bus, consumer_shutdown).await });
    eventually(|| {
        let ready = bus.subscriber_count(CUSTOMERS_TOPIC) == 1;
        async move { ready }
    })
    .await;

    let ada = Uuid::new_v4();
    let grace = Uuid::new_v4();
    publish_event(&bus, &customer_created(ada)).await.unwrap();
    bus.publish(CUSTOMERS_TOPIC, "customer.archived", b"{}")
        .await
        .unwrap();
    bus.publish(CUSTOMERS_TOPIC, "customer.created", b"{\"customer_id\":")
        .await
        .unwrap();
    publish_event(&bus, &customer_updated(ada, at(12, 5, 0)))
        .await
        .unwrap();
    publish_event(&bus, &customer_updated(ada, at(12, 5, 0)))
        .await
        .unwrap();
    publish_event(&bus, &customer_created(grace)).await.unwrap();

    // Deliveries are serial, so the last customer appearing means the
    // earlier messages were all settled.
    eventually(|| {
        let repo = repo.clone();
        async move { repo.find(grace).await.unwrap().is_some() }
    })
    .await;
    trigger.trigger();
    let stats = consuming.await.unwrap().unwrap();

    assert_eq!(stats.handled, 4);
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.failed, 0);
    let stored = repo.find(ada).await.unwrap().unwrap();
    assert_eq!(stored.name, "Ada King");
    assert_eq!(stored.version, at(12, 5, 0));
}
