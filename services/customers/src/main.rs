use sea_orm::Database;
use tracing::{error, info};

use bazaar_core::shutdown;
use bazaar_core::tracing::init_tracing;
use bazaar_events::RedisStreamBus;
use bazaar_outbox::{DbOutboxStore, OutboxPublisher};

use bazaar_customers::config::CustomersConfig;
use bazaar_customers::router::build_router;
use bazaar_customers::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = CustomersConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(shutdown::trigger_on_signal(trigger));

    // Outbox publisher
    let publisher = if config.publisher_enabled {
        let bus = RedisStreamBus::connect(config.bus).expect("failed to create Redis pool");
        let publisher =
            OutboxPublisher::new(DbOutboxStore::new(db.clone()), bus, config.publisher)
                .expect("invalid outbox publisher configuration");
        let shutdown = shutdown.clone();
        Some(tokio::spawn(async move { publisher.run(shutdown).await }))
    } else {
        info!("outbox publisher disabled");
        None
    };

    // HTTP server
    let router = build_router(AppState { db });
    let http_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("customers service listening on {http_addr}");
    let mut stopping = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { stopping.triggered().await })
        .await
        .expect("server error");

    if let Some(handle) = publisher {
        if let Err(e) = handle.await {
            error!(error = %e, "outbox publisher task failed");
        }
    }
    info!("customers service stopped");
}
