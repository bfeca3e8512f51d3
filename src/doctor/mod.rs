//! Doctor command for deployment diagnostics
//!
//! Checks that the services the chat pipeline depends on are reachable.

use colored::Colorize;
use std::time::Duration;

use crate::chat::OllamaChatClient;
use crate::config::{Config, VectorStoreConfig};
use crate::errors::Result;
use crate::vector_index::{ProbeReport, QdrantIndex};

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    config: Config,
    load_error: Option<String>,
}

impl Doctor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            load_error: None,
        }
    }

    /// Diagnose a configuration that may have failed to load; the service
    /// checks then run against the built-in defaults
    pub fn from_load(loaded: Result<Config>) -> Self {
        match loaded {
            Ok(config) => Self::new(config),
            Err(e) => Self {
                config: Config::default(),
                load_error: Some(e.to_string()),
            },
        }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        vec![
            self.check_config(),
            self.check_ollama_api().await,
            self.check_qdrant().await,
        ]
    }

    fn check_config(&self) -> HealthCheck {
        if let Some(err) = &self.load_error {
            return HealthCheck::new(
                "Configuration",
                HealthStatus::Fail(format!("{} (other checks use defaults)", err)),
            );
        }
        match self.config.validate() {
            Ok(()) => HealthCheck::new("Configuration", HealthStatus::Pass),
            Err(e) => HealthCheck::new("Configuration", HealthStatus::Fail(e.to_string())),
        }
    }

    async fn check_ollama_api(&self) -> HealthCheck {
        let client =
            match OllamaChatClient::with_config(&self.config.ollama.base_url, Duration::from_secs(5))
            {
                Ok(client) => client,
                Err(e) => {
                    return HealthCheck::new(
                        "Ollama API",
                        HealthStatus::Fail(format!("Cannot build client: {}", e)),
                    )
                }
            };

        match client.health_check().await {
            Ok(true) => HealthCheck::new("Ollama API", HealthStatus::Pass),
            Ok(false) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!(
                    "Not reachable at {} (start with: ollama serve)",
                    client.base_url()
                )),
            ),
            Err(e) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!("Error checking Ollama: {}", e)),
            ),
        }
    }

    async fn check_qdrant(&self) -> HealthCheck {
        let probe = QdrantIndex::probe(&self.config.vector_store).await;
        qdrant_status(&self.config.vector_store, probe)
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "Backend Oracle Diagnostics".bold());
        println!("{:<20} Status", "Check");
        println!("{}", "=".repeat(50));

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass => "PASS".green().to_string(),
                HealthStatus::Warn(msg) => format!("{} {}", "WARN:".yellow(), msg),
                HealthStatus::Fail(msg) => format!("{} {}", "FAIL:".red(), msg),
            };
            println!("{:<20} {}", check.name, status);
        }

        println!();
    }

    /// False when any check failed
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks
            .iter()
            .any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

fn qdrant_status(store: &VectorStoreConfig, probe: Result<ProbeReport>) -> HealthCheck {
    match probe {
        Ok(report) if report.collection_exists => {
            tracing::debug!(version = %report.version, "Qdrant reachable");
            HealthCheck::new("Qdrant", HealthStatus::Pass)
        }
        Ok(_) => HealthCheck::new(
            "Qdrant",
            HealthStatus::Warn(format!(
                "Collection '{}' not found; serve creates it empty",
                store.collection
            )),
        ),
        Err(e) => HealthCheck::new(
            "Qdrant",
            HealthStatus::Fail(format!("Not reachable at {}: {}", store.url, e)),
        ),
    }
}
