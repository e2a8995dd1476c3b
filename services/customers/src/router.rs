use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use bazaar_core::health::healthz;
use bazaar_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::customer::{create_customer, delete_customer, get_customer, update_customer};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        // Customers
        .route("/customers", post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
        .with_state(state)
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
