use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{generate_questions::generate_questions, health::status, options::get_options};
use tower_http::cors::CorsLayer;

pub mod api_state;
pub mod error;
mod routes;

/// Router for the question generation API.
pub fn api_routes<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    let max_upload_bytes = app_state.service.config().max_upload_bytes;

    Router::new()
        .route("/", get(status))
        .route("/api/options", get(get_options))
        .route(
            "/api/generate-questions",
            post(generate_questions).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .layer(CorsLayer::permissive())
}
