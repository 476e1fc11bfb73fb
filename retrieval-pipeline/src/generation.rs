use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestUserMessage, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use common::error::AppError;
use tracing::debug;

/// Everything the prompt needs for one (course outcome, Bloom level) pair.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub course_outcome: &'a str,
    pub bloom_level: &'a str,
    pub question_types: &'a [String],
    pub content: &'a str,
    pub extra_instructions: Option<&'a str>,
}

pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let mut parts = vec![
        "You are a question generation assistant.".to_string(),
        format!("Course Outcome: {}", input.course_outcome),
        format!("Bloom's Level: {}", input.bloom_level),
        format!("Question Types: {}", input.question_types.join(", ")),
        format!("Content:\n{}", input.content),
    ];
    if let Some(extra) = input.extra_instructions.filter(|extra| !extra.is_empty()) {
        parts.push(format!("Instructions: {extra}"));
    }
    parts.push("Generate appropriate questions for the above CO and context.".to_string());
    parts.push("Format:\nObjective:\n1. ...\nShort Answer:\n1. ... etc.".to_string());

    parts.join("\n")
}

/// Turns a prompt into free-text exam questions.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

/// Chat-completions backed generator for any OpenAI-compatible endpoint.
pub struct OpenAIQuestionGenerator {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAIQuestionGenerator {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl QuestionGenerator for OpenAIQuestionGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AppError> {
        let request = create_generation_request(prompt, &self.model)?;
        let response = self.client.chat().create(request).await?;
        let output = process_generation_response(response)?;

        debug!(
            model = %self.model,
            output_chars = output.len(),
            "Generated questions"
        );

        Ok(output)
    }
}

pub fn create_generation_request(
    prompt: &str,
    model: &str,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([ChatCompletionRequestUserMessage::from(prompt).into()])
        .build()
}

pub fn process_generation_response(
    response: CreateChatCompletionResponse,
) -> Result<String, AppError> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_ref())
        .map(|content| content.trim().to_string())
        .ok_or(AppError::LLMParsing(
            "No content found in LLM response".into(),
        ))
}
