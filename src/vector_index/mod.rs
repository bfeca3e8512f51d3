//! Vector Index
//!
//! Stores vectors with payload metadata and answers nearest-neighbor
//! queries. Search is fail-soft (errors become "no matches"); collection
//! setup and ingestion propagate their errors.
//!
//! Components:
//! - `QdrantIndex`: network adapter over the Qdrant gRPC API
//! - `InMemoryIndex`: brute-force index for tests and offline runs

pub mod memory;
pub mod qdrant;

pub use memory::InMemoryIndex;
pub use qdrant::{ProbeReport, QdrantIndex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::errors::{RagError, Result};

/// Similarity metric of a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

/// One nearest-neighbor match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Similarity, higher is more relevant
    pub score: f32,
    pub payload: Map<String, JsonValue>,
}

/// Point identifier accepted by the index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointKey {
    Num(u64),
    Uuid(String),
}

impl std::fmt::Display for PointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointKey::Num(n) => write!(f, "{}", n),
            PointKey::Uuid(u) => f.write_str(u),
        }
    }
}

/// A document to store; `id: None` lets the index assign one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PointKey>,
    #[serde(default)]
    pub payload: Map<String, JsonValue>,
}

impl Document {
    /// Document with a `text` field and an optional `source` label
    pub fn text(text: impl Into<String>, source: Option<&str>) -> Self {
        let mut payload = Map::new();
        payload.insert("text".to_string(), JsonValue::String(text.into()));
        if let Some(source) = source {
            payload.insert("source".to_string(), JsonValue::String(source.to_string()));
        }
        Self { id: None, payload }
    }

    pub fn with_id(mut self, id: PointKey) -> Self {
        self.id = Some(id);
        self
    }
}

/// Nearest-neighbor store over fixed-dimensionality vectors
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the collection unless it already exists
    async fn ensure_collection(&self, name: &str, dimension: usize, distance: Distance)
        -> Result<()>;

    /// Up to `limit` hits, most similar first; errors propagate
    async fn try_search(&self, vector: &[f32], limit: usize) -> Result<Vec<SearchHit>>;

    /// Insert or overwrite one point per document, in order
    async fn upsert(&self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<usize>;

    /// Number of stored points
    async fn count(&self) -> Result<u64>;

    /// Fail-soft search: any backend error yields an empty result
    async fn search(&self, vector: &[f32], limit: usize) -> Vec<SearchHit> {
        match self.try_search(vector, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "Vector search failed, treating as no matches");
                Vec::new()
            }
        }
    }
}

/// Check an ingestion batch before touching the backend
pub fn validate_batch(
    documents: &[Document],
    embeddings: &[Vec<f32>],
    dimension: usize,
) -> Result<()> {
    if documents.len() != embeddings.len() {
        return Err(RagError::Storage(format!(
            "Got {} documents but {} embeddings",
            documents.len(),
            embeddings.len()
        )));
    }

    check_dimension(embeddings.iter().map(Vec::len), dimension)
}

/// Every length must equal the collection dimensionality
pub fn check_dimension(lengths: impl IntoIterator<Item = usize>, dimension: usize) -> Result<()> {
    match lengths.into_iter().find(|len| *len != dimension) {
        Some(actual) => Err(RagError::DimensionMismatch {
            expected: dimension,
            actual,
        }),
        None => Ok(()),
    }
}
