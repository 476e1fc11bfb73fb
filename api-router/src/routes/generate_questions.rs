use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use retrieval_pipeline::service::{GeneratedQuestion, QuestionRequest};
use serde::Serialize;
use tracing::info;
use url::form_urlencoded;

use crate::{api_state::ApiState, error::ApiError};

const COURSE_OUTCOMES_FIELD: &str = "selected_cos[]";
const BLOOM_LEVELS_FIELD: &str = "selected_bloom[]";
const QUESTION_TYPES_FIELD: &str = "selected_types[]";
const EXTRA_PROMPT_FIELD: &str = "extra_prompt";

#[derive(Debug, TryFromMultipart)]
pub struct GenerateParams {
    #[form_data(field_name = "selected_cos[]", default)]
    pub selected_cos: Vec<String>,
    #[form_data(field_name = "selected_bloom[]", default)]
    pub selected_bloom: Vec<String>,
    #[form_data(field_name = "selected_types[]", default)]
    pub selected_types: Vec<String>,
    pub extra_prompt: Option<String>,
    #[form_data(limit = "unlimited")]
    pub case_material: Option<FieldData<Bytes>>,
}

impl TryFrom<GenerateParams> for QuestionRequest {
    type Error = ApiError;

    fn try_from(params: GenerateParams) -> Result<Self, Self::Error> {
        let mut request = Self {
            selected_cos: params.selected_cos,
            selected_blooms: params.selected_bloom,
            selected_types: params.selected_types,
            extra_prompt: params.extra_prompt.filter(|extra| !extra.is_empty()),
            case_material: None,
        };
        // Required fields are reported before anything about the upload.
        request.validate()?;

        request.case_material = params
            .case_material
            .map(|field| {
                String::from_utf8(field.contents.to_vec()).map_err(|_| {
                    ApiError::ValidationError("Case material must be UTF-8 text".to_string())
                })
            })
            .transpose()?;

        Ok(request)
    }
}

/// Question request read from either a multipart or an urlencoded form body.
#[derive(Debug)]
pub struct GenerateForm(pub QuestionRequest);

impl<S> FromRequest<S> for GenerateForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if is_multipart {
            let TypedMultipart(params) =
                TypedMultipart::<GenerateParams>::from_request(req, state).await?;
            return Ok(Self(params.try_into()?));
        }

        let body = Bytes::from_request(req, state).await?;
        Ok(Self(parse_urlencoded(&body)))
    }
}

fn parse_urlencoded(body: &[u8]) -> QuestionRequest {
    let mut request = QuestionRequest::default();
    for (key, value) in form_urlencoded::parse(body) {
        match key.as_ref() {
            COURSE_OUTCOMES_FIELD => request.selected_cos.push(value.into_owned()),
            BLOOM_LEVELS_FIELD => request.selected_blooms.push(value.into_owned()),
            QUESTION_TYPES_FIELD => request.selected_types.push(value.into_owned()),
            EXTRA_PROMPT_FIELD if !value.is_empty() => {
                request.extra_prompt = Some(value.into_owned());
            }
            _ => {}
        }
    }
    request
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub questions: Vec<GeneratedQuestion>,
}

pub async fn generate_questions(
    State(state): State<ApiState>,
    GenerateForm(request): GenerateForm,
) -> Result<impl IntoResponse, ApiError> {
    info!(
        cos = request.selected_cos.len(),
        blooms = request.selected_blooms.len(),
        types = request.selected_types.len(),
        has_extra_prompt = request.extra_prompt.is_some(),
        case_material_bytes = request.case_material.as_ref().map_or(0, String::len),
        "Received question generation request"
    );

    let questions = state.service.generate(request).await?;

    Ok((StatusCode::OK, Json(GenerateResponse { questions })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoded_body_collects_repeated_keys_in_order() {
        let body = b"selected_cos%5B%5D=Understand+recursion&selected_cos%5B%5D=Apply+sorting\
            &selected_bloom%5B%5D=Remember&selected_types%5B%5D=Objective\
            &selected_types%5B%5D=Short+Answer&extra_prompt=Keep+it+short&unrelated=1";

        let request = parse_urlencoded(body);

        assert_eq!(request.selected_cos, vec!["Understand recursion", "Apply sorting"]);
        assert_eq!(request.selected_blooms, vec!["Remember"]);
        assert_eq!(request.selected_types, vec!["Objective", "Short Answer"]);
        assert_eq!(request.extra_prompt.as_deref(), Some("Keep it short"));
        assert!(request.case_material.is_none());
    }

    #[test]
    fn empty_urlencoded_body_yields_empty_request() {
        let request = parse_urlencoded(b"extra_prompt=");

        assert!(request.selected_cos.is_empty());
        assert!(request.extra_prompt.is_none());
    }
}
