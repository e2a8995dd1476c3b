use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Customers service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum CustomersServiceError {
    #[error("invalid name")]
    InvalidName,
    #[error("invalid email")]
    InvalidEmail,
    #[error("missing data")]
    MissingData,
    #[error("email already in use")]
    EmailTaken,
    #[error("customer not found")]
    CustomerNotFound,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl CustomersServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidName => "INVALID_NAME",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::MissingData => "MISSING_DATA",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for CustomersServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidName | Self::InvalidEmail | Self::MissingData => StatusCode::BAD_REQUEST,
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::CustomerNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if let Self::Internal(ref e) = self {
            tracing::error!(error = format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
