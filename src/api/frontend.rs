use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Serves the built single-page front end, answering unknown paths with
/// `index.html` so client-side routing keeps working.
pub fn serve(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

pub async fn not_built() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Frontend not built",
            "message": "Please build the front end and set PORTFOLIO_STATIC_DIR"
        })),
    )
}
