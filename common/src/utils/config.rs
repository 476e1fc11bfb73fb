use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackendKind {
    #[default]
    FastEmbed,
    OpenAI,
    Hashed,
}

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_generation_model")]
    pub generation_model: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_transcript_file")]
    pub transcript_file: String,
    #[serde(default = "default_course_outcomes_file")]
    pub course_outcomes_file: String,
    #[serde(default = "default_corpus_snapshot_file")]
    pub corpus_snapshot_file: String,
    #[serde(default = "default_question_log_file")]
    pub question_log_file: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub embedding_backend: EmbeddingBackendKind,
    #[serde(default)]
    pub fastembed_model: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: u32,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            generation_model: default_generation_model(),
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            transcript_file: default_transcript_file(),
            course_outcomes_file: default_course_outcomes_file(),
            corpus_snapshot_file: default_corpus_snapshot_file(),
            question_log_file: default_question_log_file(),
            chunk_size: default_chunk_size(),
            embedding_backend: EmbeddingBackendKind::default(),
            fastembed_model: None,
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl AppConfig {
    pub fn transcript_path(&self) -> PathBuf {
        self.data_path(&self.transcript_file)
    }

    pub fn course_outcomes_path(&self) -> PathBuf {
        self.data_path(&self.course_outcomes_file)
    }

    pub fn corpus_snapshot_path(&self) -> PathBuf {
        self.data_path(&self.corpus_snapshot_file)
    }

    pub fn question_log_path(&self) -> PathBuf {
        self.data_path(&self.question_log_file)
    }

    fn data_path(&self, file: &str) -> PathBuf {
        PathBuf::from(&self.data_dir).join(file)
    }
}

fn default_data_dir() -> String {
    ".".to_string()
}

// Gemini exposes an OpenAI-compatible surface, so the same client serves both.
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta/openai/".to_string()
}

fn default_generation_model() -> String {
    "gemini-1.5-pro".to_string()
}

const fn default_http_port() -> u16 {
    5000
}

fn default_transcript_file() -> String {
    "cleaned_transcript.txt".to_string()
}

fn default_course_outcomes_file() -> String {
    "course_outcomes.txt".to_string()
}

fn default_corpus_snapshot_file() -> String {
    "corpus_snapshot.json".to_string()
}

fn default_question_log_file() -> String {
    "generated_questions.jsonl".to_string()
}

const fn default_chunk_size() -> usize {
    500
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

const fn default_embedding_dimensions() -> u32 {
    384
}

const fn default_max_upload_bytes() -> usize {
    10_000_000
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_file_layout() {
        let config = AppConfig::default();

        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.http_port, 5000);
        assert_eq!(config.embedding_backend, EmbeddingBackendKind::FastEmbed);
        assert_eq!(
            config.transcript_path(),
            PathBuf::from(".").join("cleaned_transcript.txt")
        );
        assert_eq!(
            config.course_outcomes_path(),
            PathBuf::from(".").join("course_outcomes.txt")
        );
    }

    #[test]
    fn paths_are_resolved_against_data_dir() {
        let config = AppConfig {
            data_dir: "/srv/questions".into(),
            question_log_file: "log.jsonl".into(),
            ..Default::default()
        };

        assert_eq!(
            config.question_log_path(),
            PathBuf::from("/srv/questions/log.jsonl")
        );
        assert_eq!(
            config.corpus_snapshot_path(),
            PathBuf::from("/srv/questions/corpus_snapshot.json")
        );
    }

    #[test]
    fn missing_api_key_fails_deserialization() {
        let result = Config::builder()
            .set_override("http_port", 8080)
            .and_then(|builder| builder.build())
            .and_then(|config| config.try_deserialize::<AppConfig>());

        assert!(result.is_err());
    }

    #[test]
    fn backend_kind_parses_lowercase_names() {
        let config: AppConfig = Config::builder()
            .set_override("openai_api_key", "key")
            .and_then(|builder| builder.set_override("embedding_backend", "hashed"))
            .and_then(|builder| builder.build())
            .and_then(|config| config.try_deserialize())
            .expect("config should deserialize");

        assert_eq!(config.embedding_backend, EmbeddingBackendKind::Hashed);
        assert_eq!(config.openai_api_key, "key");
    }
}
