use std::{
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::AppError;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Chunk texts and their embeddings, stored in index order.
///
/// The flat index is a pure function of `embeddings`, so it is rebuilt on load
/// instead of being stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    pub version: u32,
    pub embedding_backend: String,
    pub embedding_model: Option<String>,
    pub dimension: usize,
    pub chunks: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
}

impl CorpusSnapshot {
    pub fn new(
        embedding_backend: impl Into<String>,
        embedding_model: Option<String>,
        dimension: usize,
        chunks: Vec<String>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, AppError> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::InternalError(format!(
                "snapshot has {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(AppError::InternalError(format!(
                "snapshot embedding has dimension {}, expected {dimension}",
                bad.len()
            )));
        }

        Ok(Self {
            version: SNAPSHOT_VERSION,
            embedding_backend: embedding_backend.into(),
            embedding_model,
            dimension,
            chunks,
            embeddings,
        })
    }

    /// Whether vectors in this snapshot are comparable with ones produced by the given embedder.
    pub fn is_compatible_with(&self, backend: &str, model: Option<&str>, dimension: usize) -> bool {
        self.embedding_backend == backend
            && self.embedding_model.as_deref() == model
            && self.dimension == dimension
    }
}

/// Persists the transcript corpus as a single JSON document.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    path: PathBuf,
}

impl CorpusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot to a temporary sibling file and renames it into place,
    /// so readers never observe a partially written snapshot.
    pub async fn save(&self, snapshot: &CorpusSnapshot) -> Result<(), AppError> {
        let path = self.path.clone();
        let payload = serde_json::to_vec(snapshot)?;

        tokio::task::spawn_blocking(move || -> Result<(), AppError> {
            let dir = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
            std::fs::create_dir_all(&dir)?;

            let mut temp = NamedTempFile::new_in(&dir)?;
            {
                let mut writer = BufWriter::new(temp.as_file_mut());
                writer.write_all(&payload)?;
                writer.flush()?;
            }
            temp.as_file().sync_all()?;
            temp.persist(&path).map_err(|err| err.error)?;
            Ok(())
        })
        .await??;

        info!(
            path = %self.path.display(),
            chunks = snapshot.chunks.len(),
            dimension = snapshot.dimension,
            "Saved corpus snapshot"
        );

        Ok(())
    }

    /// Returns `None` when no usable snapshot exists.
    pub async fn load(&self) -> Result<Option<CorpusSnapshot>, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let snapshot: CorpusSnapshot = serde_json::from_slice(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                path = %self.path.display(),
                found = snapshot.version,
                expected = SNAPSHOT_VERSION,
                "Ignoring corpus snapshot with unknown version"
            );
            return Ok(None);
        }
        if snapshot.chunks.len() != snapshot.embeddings.len() {
            return Err(AppError::InternalError(format!(
                "corpus snapshot at {} is inconsistent: {} chunks, {} embeddings",
                self.path.display(),
                snapshot.chunks.len(),
                snapshot.embeddings.len()
            )));
        }

        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> CorpusSnapshot {
        CorpusSnapshot::new(
            "hashed",
            None,
            3,
            vec![
                "Recursion needs a base case..".to_string(),
                "Quicksort partitions around a pivot (café)..".to_string(),
            ],
            vec![
                vec![0.1, 0.2, 0.3],
                vec![1.0e-7, 1.0 / 3.0, -0.000_123_456_79],
            ],
        )
        .expect("valid snapshot")
    }

    #[tokio::test]
    async fn load_returns_none_when_file_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CorpusStore::new(dir.path().join("corpus_snapshot.json"));

        let loaded = store.load().await.expect("load");

        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips_exactly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CorpusStore::new(dir.path().join("corpus_snapshot.json"));
        let snapshot = sample_snapshot();

        store.save(&snapshot).await.expect("save");
        let loaded = store.load().await.expect("load").expect("snapshot present");

        assert_eq!(loaded, snapshot);
        for (before, after) in snapshot.embeddings.iter().zip(&loaded.embeddings) {
            let before_bits: Vec<u32> = before.iter().map(|v| v.to_bits()).collect();
            let after_bits: Vec<u32> = after.iter().map(|v| v.to_bits()).collect();
            assert_eq!(before_bits, after_bits);
        }
    }

    #[tokio::test]
    async fn save_creates_missing_parent_directories_and_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CorpusStore::new(dir.path().join("nested/cache/corpus_snapshot.json"));

        store.save(&sample_snapshot()).await.expect("first save");
        let replacement =
            CorpusSnapshot::new("hashed", None, 1, vec!["only".into()], vec![vec![0.5]])
                .expect("valid snapshot");
        store.save(&replacement).await.expect("second save");

        let loaded = store.load().await.expect("load").expect("snapshot present");
        assert_eq!(loaded, replacement);
    }

    #[tokio::test]
    async fn unknown_version_is_treated_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CorpusStore::new(dir.path().join("corpus_snapshot.json"));
        let mut snapshot = sample_snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        tokio::fs::write(store.path(), serde_json::to_vec(&snapshot).expect("json"))
            .await
            .expect("write");

        assert!(store.load().await.expect("load").is_none());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = CorpusStore::new(dir.path().join("corpus_snapshot.json"));
        tokio::fs::write(store.path(), b"{ not json").await.expect("write");

        let result = store.load().await;

        assert!(matches!(result, Err(AppError::Serialization(_))));
    }

    #[test]
    fn new_rejects_mismatched_lengths_and_dimensions() {
        let lengths = CorpusSnapshot::new("hashed", None, 2, vec!["a".into()], vec![]);
        assert!(matches!(lengths, Err(AppError::InternalError(_))));

        let dims = CorpusSnapshot::new("hashed", None, 2, vec!["a".into()], vec![vec![1.0]]);
        assert!(matches!(dims, Err(AppError::InternalError(_))));
    }

    #[test]
    fn compatibility_checks_backend_model_and_dimension() {
        let snapshot = CorpusSnapshot::new(
            "fastembed",
            Some("Qdrant/all-MiniLM-L6-v2-onnx".into()),
            384,
            Vec::new(),
            Vec::new(),
        )
        .expect("valid snapshot");

        assert!(snapshot.is_compatible_with("fastembed", Some("Qdrant/all-MiniLM-L6-v2-onnx"), 384));
        assert!(!snapshot.is_compatible_with("hashed", None, 384));
        assert!(!snapshot.is_compatible_with("fastembed", Some("other"), 384));
        assert!(!snapshot.is_compatible_with("fastembed", Some("Qdrant/all-MiniLM-L6-v2-onnx"), 768));
    }
}
