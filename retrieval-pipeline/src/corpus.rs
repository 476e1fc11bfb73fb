use std::path::Path;

use common::{
    error::AppError,
    storage::corpus_store::{CorpusSnapshot, CorpusStore},
    utils::embedding::EmbeddingProvider,
};
use tracing::{info, instrument, warn};

use crate::{chunking::chunk_text, vector_index::FlatIndex};

/// Chunk texts, their embeddings and the flat index over them.
///
/// All three are kept the same length and in the same order: index position `i`
/// refers to `chunks[i]` and `embeddings[i]`.
#[derive(Debug, Clone)]
pub struct IndexedCorpus {
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    index: FlatIndex,
}

impl IndexedCorpus {
    pub fn from_parts(
        chunks: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        dimension: usize,
    ) -> Result<Self, AppError> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::InternalError(format!(
                "corpus has {} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut index = FlatIndex::new(dimension);
        index.add(&embeddings)?;

        Ok(Self {
            chunks,
            embeddings,
            index,
        })
    }

    pub fn from_snapshot(snapshot: CorpusSnapshot) -> Result<Self, AppError> {
        Self::from_parts(snapshot.chunks, snapshot.embeddings, snapshot.dimension)
    }

    pub fn to_snapshot(&self, embedder: &EmbeddingProvider) -> Result<CorpusSnapshot, AppError> {
        CorpusSnapshot::new(
            embedder.backend_label(),
            embedder.model_code(),
            self.index.dimension(),
            self.chunks.clone(),
            self.embeddings.clone(),
        )
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    pub fn chunk(&self, position: usize) -> Option<&str> {
        self.chunks.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Embeds every chunk in one batch and indexes the result.
pub async fn build_index(
    chunks: Vec<String>,
    embedder: &EmbeddingProvider,
) -> Result<IndexedCorpus, AppError> {
    let embeddings = embedder.embed_batch(chunks.clone()).await?;
    IndexedCorpus::from_parts(chunks, embeddings, embedder.dimension())
}

/// Reuses the cached transcript corpus when it was built by the same embedder,
/// otherwise chunks the transcript, indexes it and caches the result.
#[instrument(skip_all, fields(snapshot = %store.path().display()))]
pub async fn load_or_build_corpus(
    store: &CorpusStore,
    transcript_path: &Path,
    chunk_size: usize,
    embedder: &EmbeddingProvider,
) -> Result<IndexedCorpus, AppError> {
    if let Some(snapshot) = store.load().await? {
        let model = embedder.model_code();
        if snapshot.is_compatible_with(
            embedder.backend_label(),
            model.as_deref(),
            embedder.dimension(),
        ) {
            let corpus = IndexedCorpus::from_snapshot(snapshot)?;
            info!(chunks = corpus.len(), "Loaded cached corpus");
            return Ok(corpus);
        }
        warn!(
            cached_backend = %snapshot.embedding_backend,
            cached_dimension = snapshot.dimension,
            backend = embedder.backend_label(),
            dimension = embedder.dimension(),
            "Cached corpus was built with a different embedder; rebuilding"
        );
    }

    let transcript = tokio::fs::read_to_string(transcript_path).await?;
    let chunks = chunk_text(&transcript, chunk_size);
    if chunks.is_empty() {
        return Err(AppError::EmptyCorpus(format!(
            "transcript {} contains no text",
            transcript_path.display()
        )));
    }

    let corpus = build_index(chunks, embedder).await?;
    store.save(&corpus.to_snapshot(embedder)?).await?;
    info!(chunks = corpus.len(), "Built and cached corpus");

    Ok(corpus)
}
