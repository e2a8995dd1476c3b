use std::future::IntoFuture;

use sea_orm::Database;
use tokio::task::JoinError;
use tracing::{error, info};

use bazaar_core::shutdown;
use bazaar_core::tracing::init_tracing;
use bazaar_events::{BusError, ConsumeStats, Consumer, RedisStreamBus};

use bazaar_products::config::ProductsConfig;
use bazaar_products::handlers::events::customer_registry;
use bazaar_products::infra::db::DbKnownCustomerRepository;
use bazaar_products::router::build_router;
use bazaar_products::state::AppState;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = ProductsConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let bus = RedisStreamBus::connect(config.bus).expect("failed to create Redis pool");

    let registry = customer_registry(DbKnownCustomerRepository::new(db.clone()))
        .expect("invalid handler registry");
    let consumer = Consumer::new(registry.into_dispatcher());

    let (trigger, shutdown) = shutdown::channel();
    tokio::spawn(shutdown::trigger_on_signal(trigger));

    // Event consumer
    let consumer_shutdown = shutdown.clone();
    let mut consuming = tokio::spawn(async move { consumer.run(&bus, consumer_shutdown).await });

    // HTTP server
    let router = build_router(AppState { db });
    let http_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .expect("failed to bind");

    info!("products service listening on {http_addr}");
    let mut stopping = shutdown.clone();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move { stopping.triggered().await })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        served = &mut server => {
            served.expect("server error");
            report_consumer_exit(consuming.await);
        }
        consumed = &mut consuming => {
            let expected = shutdown.is_triggered();
            report_consumer_exit(consumed);
            if !expected {
                error!("event consumer stopped before shutdown, exiting");
                std::process::exit(1);
            }
            server.await.expect("server error");
        }
    }
    info!("products service stopped");
}

fn report_consumer_exit(joined: Result<Result<ConsumeStats, BusError>, JoinError>) {
    match joined {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => error!(error = %e, "event consumer failed to subscribe"),
        Err(e) => error!(error = %e, "event consumer task failed"),
    }
}
