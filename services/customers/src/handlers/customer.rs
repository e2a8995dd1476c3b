use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::Customer;
use crate::error::CustomersServiceError;
use crate::state::AppState;
use crate::usecase::customer::{
    CreateCustomerInput, CreateCustomerUseCase, DeleteCustomerUseCase, GetCustomerUseCase,
    UpdateCustomerInput, UpdateCustomerUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "bazaar_core::serde::to_rfc3339_ms")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(serialize_with = "bazaar_core::serde::to_rfc3339_ms")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

// ── POST /customers ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: String,
}

pub async fn create_customer(
    State(state): State<AppState>,
    Json(body): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), CustomersServiceError> {
    let usecase = CreateCustomerUseCase {
        repo: state.customer_repo(),
    };
    let customer = usecase
        .execute(CreateCustomerInput {
            name: body.name,
            email: body.email,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

// ── GET /customers/{id} ──────────────────────────────────────────────────────

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, CustomersServiceError> {
    let usecase = GetCustomerUseCase {
        repo: state.customer_repo(),
    };
    Ok(Json(usecase.execute(id).await?.into()))
}

// ── PATCH /customers/{id} ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, CustomersServiceError> {
    let usecase = UpdateCustomerUseCase {
        repo: state.customer_repo(),
    };
    let customer = usecase
        .execute(
            id,
            UpdateCustomerInput {
                name: body.name,
                email: body.email,
            },
        )
        .await?;
    Ok(Json(customer.into()))
}

// ── DELETE /customers/{id} ───────────────────────────────────────────────────

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, CustomersServiceError> {
    let usecase = DeleteCustomerUseCase {
        repo: state.customer_repo(),
    };
    usecase.execute(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
