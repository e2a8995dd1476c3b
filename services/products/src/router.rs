use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use bazaar_core::health::healthz;
use bazaar_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::customer::get_known_customer;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/customers/{id}", get(get_known_customer))
        .with_state(state)
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}
