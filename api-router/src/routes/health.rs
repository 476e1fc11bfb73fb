use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Readiness banner served at the root path.
pub async fn status() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "running", "message": "API Ready"})),
    )
}
