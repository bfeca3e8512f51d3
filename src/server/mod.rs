//! HTTP surface
//!
//! `GET /`, `GET {prefix}/health` and `POST {prefix}/chat`, served with axum.

pub mod errors;
pub mod handlers;
pub mod router;

use std::sync::Arc;
use std::time::Duration;

use crate::chat::{ChatBackend, ChatOrchestrator, ChatSettings, OllamaChatClient};
use crate::config::{AppConfig, Config};
use crate::errors::{RagError, Result};
use crate::retrieval::ContextAssembler;
use crate::services::ServiceRegistry;

pub use errors::ApiError;
pub use router::build_router;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub app: Arc<AppConfig>,
    pub api_prefix: String,
}

impl AppState {
    /// Wire the orchestrator from configuration and already-built services
    pub fn new(
        config: &Config,
        services: Arc<ServiceRegistry>,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        let assembler = ContextAssembler::new(services, config.retrieval.payload.clone());
        let orchestrator = ChatOrchestrator::new(
            assembler,
            backend,
            ChatSettings {
                model: config.ollama.model.clone(),
                temperature: config.ollama.temperature,
                top_k: config.retrieval.top_k,
            },
        );

        Self {
            orchestrator: Arc::new(orchestrator),
            app: Arc::new(config.app.clone()),
            api_prefix: normalize_prefix(&config.server.api_prefix),
        }
    }

    /// State backed by the Ollama HTTP client
    pub fn with_ollama(config: &Config, services: Arc<ServiceRegistry>) -> Result<Self> {
        let client = OllamaChatClient::with_config(
            &config.ollama.base_url,
            Duration::from_secs(config.ollama.timeout_secs),
        )?;
        Ok(Self::new(config, services, Arc::new(client)))
    }
}

/// Initialize services, bind, and serve until ctrl-c
pub async fn serve(config: Config) -> Result<()> {
    tracing::info!("Starting {}", config.app.name);

    let services = Arc::new(ServiceRegistry::from_config(&config));
    if let Err(e) = services.warm_up().await {
        tracing::error!(error = %e, "Error initializing services");
        return Err(e);
    }

    let state = AppState::with_ollama(&config, services)?;
    let app = build_router(state, config.server.cors_allow_any_origin);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, prefix = %config.server.api_prefix, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(RagError::Io)?;

    tracing::info!("Shutting down {}", config.app.name);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}

/// `""` and `"/"` both mean routes at the root; trailing slashes are dropped
fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches('/').to_string()
}
