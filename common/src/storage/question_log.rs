use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs::OpenOptions, io::AsyncWriteExt};
use tracing::debug;

use crate::{error::AppError, storage::types::generated_question::GeneratedQuestionRecord};

/// Append-only JSON Lines log of generated questions, one record per line.
#[derive(Debug, Clone)]
pub struct QuestionLog {
    path: PathBuf,
}

impl QuestionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &GeneratedQuestionRecord) -> Result<(), AppError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        debug!(
            path = %self.path.display(),
            course_outcome = %record.course_outcome,
            bloom_level = %record.bloom_level,
            "Appended question record"
        );

        Ok(())
    }

    /// Reads every record in insertion order. A missing log reads as empty.
    pub async fn read_all(&self) -> Result<Vec<GeneratedQuestionRecord>, AppError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(AppError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(co: &str, bloom: &str) -> GeneratedQuestionRecord {
        GeneratedQuestionRecord::new(
            co.to_string(),
            bloom.to_string(),
            format!("Questions for {co} at {bloom}"),
            co.to_string(),
        )
    }

    #[tokio::test]
    async fn missing_log_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = QuestionLog::new(dir.path().join("generated_questions.jsonl"));

        assert!(log.read_all().await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn append_preserves_order_and_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = QuestionLog::new(dir.path().join("generated_questions.jsonl"));

        let first = record("Understand recursion", "Remember");
        let second = record("Apply sorting", "Apply");
        log.append(&first).await.expect("append");
        log.append(&second).await.expect("append");
        log.append(&first).await.expect("append duplicate");

        let records = log.read_all().await.expect("read");
        assert_eq!(records, vec![first.clone(), second, first]);
    }

    #[tokio::test]
    async fn each_record_occupies_one_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = QuestionLog::new(dir.path().join("logs/generated_questions.jsonl"));
        let mut multiline = record("Understand recursion", "Create");
        multiline.questions = "Objective:\n1. ...\nShort Answer:\n1. ...".into();

        log.append(&multiline).await.expect("append");
        log.append(&record("Apply sorting", "Evaluate"))
            .await
            .expect("append");

        let raw = tokio::fs::read_to_string(log.path()).await.expect("read raw");
        assert_eq!(raw.lines().count(), 2);
        assert_eq!(log.read_all().await.expect("read")[0], multiline);
    }
}
