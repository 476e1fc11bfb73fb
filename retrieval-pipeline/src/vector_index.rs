use common::error::AppError;

/// Exhaustive nearest-neighbour index over fixed-dimension vectors.
///
/// Positions are assigned in insertion order and map one-to-one onto the
/// caller's parallel chunk list.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// Neighbours per query, nearest first. Distances are squared Euclidean.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResult {
    pub distances: Vec<Vec<f32>>,
    pub indices: Vec<Vec<usize>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn add(&mut self, embeddings: &[Vec<f32>]) -> Result<(), AppError> {
        self.check_dimensions(embeddings)?;
        self.vectors.extend(embeddings.iter().cloned());
        Ok(())
    }

    /// Returns the `k` nearest stored vectors for every query.
    ///
    /// Ties are broken by the lower position. `k` is clamped to the number of
    /// stored vectors.
    pub fn search(&self, queries: &[Vec<f32>], k: usize) -> Result<SearchResult, AppError> {
        self.check_dimensions(queries)?;
        let k = k.min(self.vectors.len());

        let mut result = SearchResult::default();
        for query in queries {
            let mut scored: Vec<(f32, usize)> = self
                .vectors
                .iter()
                .enumerate()
                .map(|(position, vector)| (squared_l2(query, vector), position))
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            scored.truncate(k);

            let (distances, indices): (Vec<f32>, Vec<usize>) = scored.into_iter().unzip();
            result.distances.push(distances);
            result.indices.push(indices);
        }

        Ok(result)
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<(), AppError> {
        match vectors.iter().find(|v| v.len() != self.dimension) {
            Some(bad) => Err(AppError::InternalError(format!(
                "vector has dimension {}, index expects {}",
                bad.len(),
                self.dimension
            ))),
            None => Ok(()),
        }
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
