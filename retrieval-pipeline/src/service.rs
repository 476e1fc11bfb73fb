use std::sync::Arc;

use common::{
    error::AppError,
    storage::{
        corpus_store::CorpusStore,
        question_log::QuestionLog,
        types::{course_outcome::load_course_outcomes, generated_question::GeneratedQuestionRecord},
    },
    utils::{config::AppConfig, embedding::EmbeddingProvider},
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    chunking::chunk_text,
    corpus::{build_index, load_or_build_corpus, IndexedCorpus},
    generation::{build_prompt, PromptInput, QuestionGenerator},
    search::{outcome_query, resolve_outcome, semantic_search},
};

pub const MISSING_FIELDS: &str = "Missing fields";

#[derive(Debug, Clone, Default)]
pub struct QuestionRequest {
    pub selected_cos: Vec<String>,
    pub selected_blooms: Vec<String>,
    pub selected_types: Vec<String>,
    pub extra_prompt: Option<String>,
    pub case_material: Option<String>,
}

impl QuestionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.selected_cos.is_empty()
            || self.selected_blooms.is_empty()
            || self.selected_types.is_empty()
        {
            return Err(AppError::Validation(MISSING_FIELDS.into()));
        }
        Ok(())
    }
}

/// Generated output for one (course outcome, Bloom level) pair.
///
/// `co` echoes the requested outcome; `resolved_co` is the outcome whose
/// embedding sits closest to the retrieved passage. They are not reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedQuestion {
    pub co: String,
    pub bloom_level: String,
    pub output: String,
    pub resolved_co: String,
}

/// Process-wide question generation service, built once at startup.
pub struct QuestionService {
    config: AppConfig,
    embedder: Arc<EmbeddingProvider>,
    generator: Arc<dyn QuestionGenerator>,
    corpus_store: CorpusStore,
    question_log: QuestionLog,
}

impl QuestionService {
    pub fn new(
        config: AppConfig,
        embedder: Arc<EmbeddingProvider>,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        let corpus_store = CorpusStore::new(config.corpus_snapshot_path());
        let question_log = QuestionLog::new(config.question_log_path());
        Self {
            config,
            embedder,
            generator,
            corpus_store,
            question_log,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn question_log(&self) -> &QuestionLog {
        &self.question_log
    }

    pub async fn course_outcomes(&self) -> Result<Vec<String>, AppError> {
        load_course_outcomes(&self.config.course_outcomes_path()).await
    }

    /// Generates questions for every requested (course outcome, Bloom level) pair,
    /// outer loop over outcomes, appending each result to the question log.
    ///
    /// When case material is supplied it replaces the transcript as the retrieval
    /// source for the whole request and the transcript corpus is not touched.
    /// Any failure aborts the request.
    #[instrument(skip_all, fields(
        cos = request.selected_cos.len(),
        blooms = request.selected_blooms.len(),
        has_case_material = request.case_material.is_some()
    ))]
    pub async fn generate(
        &self,
        request: QuestionRequest,
    ) -> Result<Vec<GeneratedQuestion>, AppError> {
        request.validate()?;

        let course_outcomes = self.course_outcomes().await?;
        if course_outcomes.is_empty() {
            return Err(AppError::EmptyCorpus(format!(
                "no course outcomes in {}",
                self.config.course_outcomes_path().display()
            )));
        }
        let outcome_index = build_index(course_outcomes, &self.embedder).await?;

        let retrieval_source = match request.case_material.as_deref() {
            Some(text) => self.build_case_corpus(text).await?,
            None => {
                load_or_build_corpus(
                    &self.corpus_store,
                    &self.config.transcript_path(),
                    self.config.chunk_size,
                    &self.embedder,
                )
                .await?
            }
        };

        let mut outputs =
            Vec::with_capacity(request.selected_cos.len() * request.selected_blooms.len());
        for co in &request.selected_cos {
            for bloom in &request.selected_blooms {
                let generated = self
                    .generate_pair(co, bloom, &request, &retrieval_source, &outcome_index)
                    .await?;
                outputs.push(generated);
            }
        }

        info!(generated = outputs.len(), "Question generation finished");
        Ok(outputs)
    }

    async fn build_case_corpus(&self, text: &str) -> Result<IndexedCorpus, AppError> {
        let chunks = chunk_text(text, self.config.chunk_size);
        if chunks.is_empty() {
            return Err(AppError::Validation(
                "Case material contains no text".into(),
            ));
        }
        info!(chunks = chunks.len(), "Indexing case material");
        build_index(chunks, &self.embedder).await
    }

    async fn generate_pair(
        &self,
        co: &str,
        bloom: &str,
        request: &QuestionRequest,
        retrieval_source: &IndexedCorpus,
        outcome_index: &IndexedCorpus,
    ) -> Result<GeneratedQuestion, AppError> {
        let retrieved = semantic_search(co, retrieval_source, &self.embedder, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::EmptyCorpus("retrieval returned no passage".into()))?;

        let resolved_co = resolve_outcome(
            &outcome_query(&retrieved, bloom),
            outcome_index,
            &self.embedder,
        )
        .await?;
        debug!(co, bloom, resolved_co = %resolved_co, "Retrieved passage");

        let prompt = build_prompt(&PromptInput {
            course_outcome: co,
            bloom_level: bloom,
            question_types: &request.selected_types,
            content: &retrieved,
            extra_instructions: request.extra_prompt.as_deref(),
        });
        let output = self.generator.generate(&prompt).await?;

        self.question_log
            .append(&GeneratedQuestionRecord::new(
                co.to_string(),
                bloom.to_string(),
                output.clone(),
                resolved_co.clone(),
            ))
            .await?;

        Ok(GeneratedQuestion {
            co: co.to_string(),
            bloom_level: bloom.to_string(),
            output,
            resolved_co,
        })
    }
}
