use common::{
    error::AppError,
    utils::embedding::{generate_embedding_with_provider, EmbeddingProvider},
};

use crate::corpus::IndexedCorpus;

/// Embeds `query` and returns the texts of its `k` nearest chunks, nearest first.
pub async fn semantic_search(
    query: &str,
    corpus: &IndexedCorpus,
    embedder: &EmbeddingProvider,
    k: usize,
) -> Result<Vec<String>, AppError> {
    if corpus.is_empty() {
        return Err(AppError::EmptyCorpus(
            "cannot search a corpus without chunks".into(),
        ));
    }

    let query_embedding = generate_embedding_with_provider(embedder, query).await?;
    search_by_embedding(query_embedding, corpus, k)
}

pub fn search_by_embedding(
    query_embedding: Vec<f32>,
    corpus: &IndexedCorpus,
    k: usize,
) -> Result<Vec<String>, AppError> {
    let result = corpus.index().search(&[query_embedding], k)?;

    result
        .indices
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .map(|position| {
            corpus.chunk(position).map(str::to_string).ok_or_else(|| {
                AppError::InternalError(format!("index position {position} has no chunk"))
            })
        })
        .collect()
}

/// The query used to match a retrieved passage back to a course outcome.
pub fn outcome_query(retrieved_chunk: &str, bloom_level: &str) -> String {
    format!("{retrieved_chunk} {bloom_level}")
}

/// Returns the course outcome nearest to `query`.
pub async fn resolve_outcome(
    query: &str,
    outcomes: &IndexedCorpus,
    embedder: &EmbeddingProvider,
) -> Result<String, AppError> {
    semantic_search(query, outcomes, embedder, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::EmptyCorpus("no course outcomes to match against".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::build_index;

    fn separable_corpus() -> IndexedCorpus {
        IndexedCorpus::from_parts(
            vec![
                "chunk about stacks".into(),
                "chunk about queues".into(),
                "chunk about heaps".into(),
            ],
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
            3,
        )
        .expect("corpus")
    }

    #[test]
    fn search_by_embedding_returns_closest_chunk() {
        let corpus = separable_corpus();

        let hits = search_by_embedding(vec![0.1, 0.9, 0.2], &corpus, 1).expect("search");

        assert_eq!(hits, vec!["chunk about queues"]);
    }

    #[test]
    fn search_by_embedding_orders_nearest_first() {
        let corpus = separable_corpus();

        let hits = search_by_embedding(vec![0.2, 0.0, 0.7], &corpus, 3).expect("search");

        assert_eq!(
            hits,
            vec!["chunk about heaps", "chunk about stacks", "chunk about queues"]
        );
    }

    #[test]
    fn equidistant_chunks_resolve_to_lowest_position() {
        let corpus = separable_corpus();

        let hits = search_by_embedding(vec![0.5, 0.5, 0.0], &corpus, 1).expect("search");

        assert_eq!(hits, vec!["chunk about stacks"]);
    }

    #[tokio::test]
    async fn semantic_search_finds_matching_text() {
        let embedder = EmbeddingProvider::new_hashed(256).expect("hashed provider");
        let corpus = build_index(
            vec![
                "binary search halves the interval".into(),
                "merge sort splits and merges lists".into(),
                "hash tables map keys to buckets".into(),
            ],
            &embedder,
        )
        .await
        .expect("build");

        let hits = semantic_search("merge sort splits and merges lists", &corpus, &embedder, 1)
            .await
            .expect("search");

        assert_eq!(hits, vec!["merge sort splits and merges lists"]);
    }

    #[tokio::test]
    async fn semantic_search_refuses_empty_corpus() {
        let embedder = EmbeddingProvider::new_hashed(8).expect("hashed provider");
        let corpus = IndexedCorpus::from_parts(Vec::new(), Vec::new(), 8).expect("corpus");

        let result = semantic_search("anything", &corpus, &embedder, 1).await;

        assert!(matches!(result, Err(AppError::EmptyCorpus(_))));
    }

    #[tokio::test]
    async fn resolve_outcome_picks_nearest_label() {
        let embedder = EmbeddingProvider::new_hashed(256).expect("hashed provider");
        let outcomes = build_index(
            vec!["Understand recursion".into(), "Apply sorting".into()],
            &embedder,
        )
        .await
        .expect("build");

        let query = outcome_query("Apply sorting algorithms to arrays", "Apply");
        let resolved = resolve_outcome(&query, &outcomes, &embedder)
            .await
            .expect("resolve");

        assert_eq!(resolved, "Apply sorting");
    }

    #[test]
    fn outcome_query_joins_with_a_space() {
        assert_eq!(
            outcome_query("Recursion needs a base case.", "Understand"),
            "Recursion needs a base case. Understand"
        );
    }
}
