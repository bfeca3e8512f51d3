//! Configuration management for Backend Oracle
//!
//! TOML-based configuration with built-in defaults, an optional file, and
//! environment overrides using the deployment's variable names.
//! Location: ~/.backend-oracle/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};
use crate::retrieval::{PayloadSchema, DEFAULT_TOP_K};
use crate::vector_index::Distance;

/// Complete configuration for Backend Oracle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub ollama: OllamaConfig,
    pub retrieval: RetrievalConfig,
}

/// Service identity reported by the root endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for the API routes, e.g. "/api/v1"
    pub api_prefix: String,
    pub cors_allow_any_origin: bool,
}

/// Sentence encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// HuggingFace model repository
    pub model_id: String,
    pub revision: String,
    /// L2-normalize pooled vectors
    pub normalize: bool,
    pub max_sequence_length: usize,
}

/// Qdrant connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub url: String,
    pub collection: String,
    pub dimension: usize,
    pub distance: Distance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Ollama chat-completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Retrieval tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub payload: PayloadSchema,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Backend Oracle API".to_string(),
            description: "Documentation-grounded coding assistant for backend developers"
                .to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_prefix: "/api/v1".to_string(),
            cors_allow_any_origin: true,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            revision: "main".to_string(),
            normalize: true,
            max_sequence_length: 256,
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "backend_docs".to_string(),
            dimension: 384,
            distance: Distance::Cosine,
            api_key: None,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.1,
            timeout_secs: 120,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            payload: PayloadSchema::default(),
        }
    }
}

impl Config {
    /// Load configuration: defaults, then file, then environment
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Same sources as `load`, leaving `validate` to the caller
    pub fn load_unvalidated(path: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(config_path) => Self::load_from_file(&config_path)?,
            None => Self::load_default()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| RagError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the standard location or fall back to built-in defaults
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(config_path) if config_path.exists() => Self::load_from_file(&config_path),
            _ => Ok(Config::default()),
        }
    }

    /// ~/.backend-oracle/config.toml, when a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".backend-oracle").join("config.toml"))
    }

    /// Overlay environment variables onto the loaded values
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Some(collection) = lookup("QDRANT_COLLECTION") {
            self.vector_store.collection = collection;
        }
        if let Some(dim) = lookup("QDRANT_DIM") {
            self.vector_store.dimension = parse_env("QDRANT_DIM", &dim)?;
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Some(model) = lookup("QDRANT_EMBEDDINGS_MODEL") {
            self.embedding.model_id = model;
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.ollama.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.ollama.model = model;
        }
        if let Some(prefix) = lookup("APP_API_PREFIX") {
            self.server.api_prefix = prefix;
        }
        if let Some(host) = lookup("APP_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("APP_PORT") {
            self.server.port = parse_env("APP_PORT", &port)?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.vector_store.dimension == 0 {
            return Err(RagError::Config(
                "vector_store.dimension must be greater than 0".to_string(),
            ));
        }

        if self.vector_store.collection.trim().is_empty() {
            return Err(RagError::Config(
                "vector_store.collection must not be empty".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(RagError::Config(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.payload.text_fields.is_empty() {
            return Err(RagError::Config(
                "retrieval.payload.text_fields must name at least one field".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.ollama.temperature) {
            return Err(RagError::Config(
                "ollama.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.ollama.timeout_secs == 0 {
            return Err(RagError::Config(
                "ollama.timeout_secs must be greater than 0".to_string(),
            ));
        }

        let prefix = &self.server.api_prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(RagError::Config(format!(
                "Invalid api_prefix '{}': must start with '/' and not end with '/'",
                prefix
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Socket address string for the HTTP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RagError::Config(format!("Invalid value for {}: '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.vector_store.dimension, 384);
        assert_eq!(config.ollama.timeout_secs, 120);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.top_k, DEFAULT_TOP_K);
        assert_eq!(config.server.api_prefix, "/api/v1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_dimension() {
        let mut config = Config::default();
        config.vector_store.dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_temperature() {
        let mut config = Config::default();
        config.ollama.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_prefix() {
        let mut config = Config::default();
        config.server.api_prefix = "api".to_string();
        assert!(config.validate().is_err());

        config.server.api_prefix = "/api/".to_string();
        assert!(config.validate().is_err());

        config.server.api_prefix = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_text_fields() {
        let mut config = Config::default();
        config.retrieval.payload.text_fields.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("QDRANT_URL", "http://qdrant:6334"),
            ("QDRANT_DIM", "768"),
            ("OLLAMA_MODEL", "qwen2.5:7b-instruct"),
            ("APP_API_PREFIX", "/v1"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.vector_store.url, "http://qdrant:6334");
        assert_eq!(config.vector_store.dimension, 768);
        assert_eq!(config.ollama.model, "qwen2.5:7b-instruct");
        assert_eq!(config.server.api_prefix, "/v1");
        assert_eq!(config.vector_store.collection, "backend_docs");
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|key| {
            (key == "QDRANT_DIM").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(RagError::Config(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.ollama.model = "mistral".to_string();
        config.retrieval.top_k = 8;
        config.save(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.ollama.model, "mistral");
        assert_eq!(loaded.retrieval.top_k, 8);
        assert_eq!(loaded.vector_store.distance, Distance::Cosine);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[ollama]\nmodel = \"phi3\"\n").unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.ollama.model, "phi3");
        assert_eq!(loaded.ollama.timeout_secs, 120);
        assert_eq!(loaded.vector_store.dimension, 384);
    }

    #[test]
    fn test_unvalidated_load_keeps_invalid_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[vector_store]\ndimension = 0\n").unwrap();

        assert!(Config::load(Some(path.clone())).is_err());

        let config = Config::load_unvalidated(Some(path)).unwrap();
        assert_eq!(config.vector_store.dimension, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
    }
}
