//! Ollama chat-completion client
//!
//! Non-streaming `POST /api/chat`. The response body is passed through
//! untouched; non-success statuses are surfaced with the upstream body.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::chat::types::ChatCompletionRequest;
use crate::errors::{RagError, Result};

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Request timeout for a full (non-streamed) completion
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Something that can answer a chat-completion request
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Raw JSON body of a successful completion
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<JsonValue>;
}

/// HTTP client for the Ollama chat endpoint
#[derive(Debug, Clone)]
pub struct OllamaChatClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaChatClient {
    /// Create client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_TIMEOUT)
    }

    /// Create client with custom endpoint and timeout
    pub fn with_config(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Check if Ollama is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, err: reqwest::Error) -> RagError {
        if err.is_timeout() {
            RagError::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            }
        } else {
            RagError::Http(err)
        }
    }
}

#[async_trait]
impl ChatBackend for OllamaChatClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<JsonValue> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        tracing::info!(status = status.as_u16(), "Ollama response status");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(status = status.as_u16(), body = %body, "Ollama error response");
            return Err(RagError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body: JsonValue = response.json().await.map_err(|e| self.map_send_error(e))?;
        tracing::debug!(response = %body, "Ollama response");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::types::{ChatMessage, SamplingOptions};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_fake_ollama(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "llama3.2".to_string(),
            messages: vec![ChatMessage::user("How do I mount static files?")],
            stream: false,
            options: SamplingOptions { temperature: 0.1 },
        }
    }

    #[test]
    fn test_client_creation() {
        let client = OllamaChatClient::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);

        let client =
            OllamaChatClient::with_config("http://ollama:11434/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://ollama:11434");
    }

    #[tokio::test]
    async fn test_complete_passes_body_through() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<JsonValue>| async move {
                Json(json!({
                    "model": body["model"],
                    "message": {"role": "assistant", "content": "Use StaticFiles"},
                    "done": true,
                    "echo_stream": body["stream"],
                    "echo_temperature": body["options"]["temperature"],
                }))
            }),
        );
        let base = spawn_fake_ollama(router).await;
        let client = OllamaChatClient::with_config(&base, Duration::from_secs(5)).unwrap();

        let body = client.complete(&request()).await.unwrap();
        assert_eq!(body["message"]["content"], "Use StaticFiles");
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["echo_stream"], false);
        assert!((body["echo_temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_non_success_surfaces_status_and_body() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::NOT_FOUND, "model \"llama3.2\" not found") }),
        );
        let base = spawn_fake_ollama(router).await;
        let client = OllamaChatClient::with_config(&base, Duration::from_secs(5)).unwrap();

        match client.complete(&request()).await {
            Err(RagError::Upstream { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "model \"llama3.2\" not found");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"done": true}))
            }),
        );
        let base = spawn_fake_ollama(router).await;
        let client = OllamaChatClient::with_config(&base, Duration::from_millis(100)).unwrap();

        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, RagError::Timeout { duration_ms: 100 }));
    }

    #[tokio::test]
    async fn test_health_check() {
        let router = Router::new().route("/api/version", get(|| async { "{\"version\":\"0.5\"}" }));
        let base = spawn_fake_ollama(router).await;
        let client = OllamaChatClient::with_config(&base, Duration::from_secs(5)).unwrap();
        assert!(client.health_check().await.unwrap());

        let offline =
            OllamaChatClient::with_config("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(!offline.health_check().await.unwrap());
    }
}
