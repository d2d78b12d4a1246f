use crate::api::schemas::health::HealthResponse;
use axum::{Json, response::IntoResponse};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Liveness probe: returns 200 OK as long as the server is running.
pub async fn health() -> impl IntoResponse {
    let timestamp = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();

    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Portfolio API is running".to_string(),
        timestamp,
    })
}
