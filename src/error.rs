use crate::domain::contact::FieldError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub const DELIVERY_FAILED_MESSAGE: &str = "Failed to send message. Please try again later.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Email delivery failed")]
    DeliveryFailed,
    #[error("API endpoint not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(errors) => {
                tracing::debug!(fields = ?errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(), "Validation failed");
                (StatusCode::BAD_REQUEST, json!({ "error": "Validation failed", "details": errors }))
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            Self::DeliveryFailed => {
                // The provider diagnostic was already logged where it happened.
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": DELIVERY_FAILED_MESSAGE }))
            }
            Self::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "API endpoint not found" })),
            Self::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, json!({ "error": "Method not allowed" })),
        };

        (status, Json(body)).into_response()
    }
}
