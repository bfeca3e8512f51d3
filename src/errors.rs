//! Error types for Backend Oracle
//!
//! One taxonomy for the whole retrieval and chat path. Search-path failures
//! are absorbed by the context assembler; setup, ingestion and upstream
//! failures travel up to the caller.

use thiserror::Error;

/// Main error type for the retrieval and chat pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Embedding backend unavailable or misconfigured
    #[error("Embedding model error: {0}")]
    Model(String),

    /// Vector index unreachable or rejected the operation
    #[error("Vector store error: {0}")]
    Storage(String),

    /// Vector length differs from the collection's configured size
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Chat-completion service answered with a non-success status
    #[error("Ollama API error: {body}")]
    Upstream { status: u16, body: String },

    /// Malformed client request
    #[error("{0}")]
    Validation(String),

    /// Outbound call exceeded its deadline
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl RagError {
    /// True for embedding backend failures
    pub fn is_model(&self) -> bool {
        matches!(self, RagError::Model(_))
    }

    /// True for vector index failures, including dimension mismatches
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            RagError::Storage(_) | RagError::DimensionMismatch { .. }
        )
    }

    /// True when the caller sent something we cannot act on
    pub fn is_client_error(&self) -> bool {
        matches!(self, RagError::Validation(_))
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(format!("{:#}", err))
    }
}
