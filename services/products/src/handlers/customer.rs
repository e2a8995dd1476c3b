use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ProductsServiceError;
use crate::state::AppState;
use crate::usecase::customer::GetKnownCustomerUseCase;

#[derive(Serialize)]
pub struct KnownCustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "bazaar_core::serde::to_rfc3339_ms")]
    pub synced_version: chrono::DateTime<chrono::Utc>,
}

// ── GET /customers/{id} ──────────────────────────────────────────────────────

pub async fn get_known_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<KnownCustomerResponse>, ProductsServiceError> {
    let usecase = GetKnownCustomerUseCase {
        repo: state.known_customer_repo(),
    };
    let customer = usecase.execute(id).await?;
    Ok(Json(KnownCustomerResponse {
        id: customer.customer_id,
        name: customer.name,
        email: customer.email,
        synced_version: customer.version,
    }))
}
