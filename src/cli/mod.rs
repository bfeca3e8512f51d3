//! Command-line interface
//!
//! Argument parsing plus the `ask` and `config` command bodies.

pub mod args;

pub use args::{Args, Commands};

use std::sync::Arc;

use crate::config::Config;
use crate::errors::{RagError, Result};
use crate::server::AppState;
use crate::services::ServiceRegistry;

/// Run one question through the full pipeline and return the upstream JSON
pub async fn ask(config: &Config, question: &str) -> Result<serde_json::Value> {
    let services = Arc::new(ServiceRegistry::from_config(config));
    let state = AppState::with_ollama(config, services)?;
    state
        .orchestrator
        .answer(&[crate::chat::ChatMessage::user(question)])
        .await
}

/// Effective configuration rendered as TOML
pub fn render_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| RagError::Config(format!("Failed to serialize config: {}", e)))
}
