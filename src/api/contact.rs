use crate::api::AppState;
use crate::api::schemas::contact::ContactResponse;
use crate::error::{AppError, Result};
use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};
use serde_json::{Map, Value};

/// `POST /api/contact`. Only a JSON object is a submission; anything else is
/// a malformed body.
pub async fn submit_contact(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(object) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected contact payload");
        AppError::BadRequest("Invalid request body".to_string())
    })?;

    state.contact_service.submit_object(&object).await?;

    Ok(Json(ContactResponse::sent()))
}
