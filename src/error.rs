// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unauthorized access")]
    Unauthorized,

    #[error("forbidden access: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl AppError {
    /// Status code and stable machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::PaymentGateway(_) => (StatusCode::BAD_GATEWAY, "payment_gateway_error"),
            AppError::IdentityProvider(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "identity_provider_error")
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();

        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                "internal server error".to_string()
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                "internal server error".to_string()
            }
            AppError::PaymentGateway(msg) => {
                tracing::error!(error = %msg, "Payment gateway error");
                self.to_string()
            }
            AppError::IdentityProvider(msg) => {
                tracing::error!(error = %msg, "Identity provider error");
                "identity provider unavailable".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_map_to_distinct_statuses() {
        assert_eq!(
            AppError::Unauthorized.status_and_code().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("not an admin".into()).status_and_code().0,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn database_details_are_not_leaked() {
        let response = AppError::Database("connection refused to 10.0.0.3".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "database_error");
        assert_eq!(json["message"], "internal server error");
    }
}
