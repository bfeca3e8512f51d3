//! Embedding Provider
//!
//! Maps text to fixed-dimensionality dense vectors. The provider is
//! expensive to build (model download + load) and is shared process-wide
//! through the service registry.

pub mod engine;

pub use engine::EmbeddingEngine;

use async_trait::async_trait;

use crate::errors::{RagError, Result};

/// Text-in, vector-out capability
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Encode every input, preserving order; each vector has `dimension()` entries
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output dimensionality
    fn dimension(&self) -> usize;

    /// Encode a single text and return its only vector
    async fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        self.encode(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Model("Encoder returned no vectors".to_string()))
    }
}
