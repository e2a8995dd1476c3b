use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Products service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum ProductsServiceError {
    #[error("customer not found")]
    CustomerNotFound,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ProductsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for ProductsServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::CustomerNotFound => StatusCode::NOT_FOUND,
            Self::Internal(e) => {
                tracing::error!(error = format!("{e:#}"), kind = "INTERNAL", "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
