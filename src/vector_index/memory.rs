//! Brute-force in-process vector index
//!
//! Exact nearest-neighbor search over a `Vec`, scored with the same metric
//! semantics Qdrant uses (Euclid is reported as negative distance so that
//! higher is always better).

use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use tokio::sync::RwLock;

use crate::errors::Result;
use crate::vector_index::{
    check_dimension, validate_batch, Distance, Document, PointKey, SearchHit, VectorIndex,
};

struct StoredPoint {
    id: PointKey,
    vector: Vec<f32>,
    payload: serde_json::Map<String, serde_json::Value>,
}

/// In-memory vector index
pub struct InMemoryIndex {
    dimension: usize,
    distance: Distance,
    points: RwLock<Vec<StoredPoint>>,
    searches: AtomicUsize,
}

impl InMemoryIndex {
    pub fn new(dimension: usize, distance: Distance) -> Self {
        Self {
            dimension,
            distance,
            points: RwLock::new(Vec::new()),
            searches: AtomicUsize::new(0),
        }
    }

    /// Number of search calls served so far
    pub fn search_count(&self) -> usize {
        self.searches.load(AtomicOrdering::SeqCst)
    }

    fn score(&self, query: &[f32], candidate: &[f32]) -> f32 {
        match self.distance {
            Distance::Cosine => cosine_similarity(query, candidate),
            Distance::Dot => dot(query, candidate),
            Distance::Euclid => -query
                .iter()
                .zip(candidate)
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = dot(a, a).sqrt() * dot(b, b).sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot(a, b) / denom
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ensure_collection(&self, _name: &str, dimension: usize, _: Distance) -> Result<()> {
        check_dimension([dimension], self.dimension)
    }

    async fn try_search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>> {
        self.searches.fetch_add(1, AtomicOrdering::SeqCst);
        check_dimension([vector.len()], self.dimension)?;

        let points = self.points.read().await;
        let mut scored: Vec<(f32, usize)> = points
            .iter()
            .enumerate()
            .map(|(idx, point)| (self.score(vector, &point.vector), idx))
            .collect();

        // Ties keep insertion order
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, idx)| SearchHit {
                score,
                payload: points[idx].payload.clone(),
            })
            .collect())
    }

    async fn upsert(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<usize> {
        validate_batch(&documents, &embeddings, self.dimension)?;

        let mut points = self.points.write().await;
        let written = documents.len();
        for (doc, vector) in documents.into_iter().zip(embeddings) {
            let id = doc
                .id
                .unwrap_or_else(|| PointKey::Uuid(uuid::Uuid::new_v4().to_string()));
            let point = StoredPoint {
                id,
                vector,
                payload: doc.payload,
            };
            match points.iter().position(|p| p.id == point.id) {
                Some(pos) => points[pos] = point,
                None => points.push(point),
            }
        }

        Ok(written)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.points.read().await.len() as u64)
    }
}
