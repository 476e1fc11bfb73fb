use axum::{extract::State, response::IntoResponse, Json};
use common::storage::types::taxonomy::{BloomLevel, QuestionType};
use serde::Serialize;

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub course_outcomes: Vec<String>,
    pub bloom_levels: [BloomLevel; 6],
    pub question_types: [QuestionType; 4],
}

/// Lists the values a client can offer for each form field.
pub async fn get_options(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let course_outcomes = state.service.course_outcomes().await?;

    Ok(Json(OptionsResponse {
        course_outcomes,
        bloom_levels: BloomLevel::ALL,
        question_types: QuestionType::ALL,
    }))
}
