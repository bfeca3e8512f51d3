//! Chat orchestrator: greeting check, retrieval, prompt assembly, completion
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::chat::client::ChatBackend;
use crate::chat::prompts::{context_message, GREETING_CONTEXT, SYSTEM_PROMPT};
use crate::chat::types::{ChatCompletionRequest, ChatMessage, SamplingOptions};
use crate::errors::{RagError, Result};
use crate::retrieval::{is_greeting, ContextAssembler};

/// Model-facing settings for each completion
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    pub top_k: usize,
}

/// Builds grounded prompts and forwards them to the chat backend
pub struct ChatOrchestrator {
    assembler: ContextAssembler,
    backend: Arc<dyn ChatBackend>,
    settings: ChatSettings,
}

impl ChatOrchestrator {
    pub fn new(
        assembler: ContextAssembler,
        backend: Arc<dyn ChatBackend>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            assembler,
            backend,
            settings,
        }
    }

    /// Answer the last message of the conversation
    pub async fn answer(&self, messages: &[ChatMessage]) -> Result<JsonValue> {
        let request = self.prepare(messages).await?;
        self.backend.complete(&request).await
    }

    /// Build the completion request without sending it.
    ///
    /// Greetings skip retrieval entirely; an empty conversation is a
    /// validation error.
    pub async fn prepare(&self, messages: &[ChatMessage]) -> Result<ChatCompletionRequest> {
        let question = match messages.last() {
            Some(message) => message.content.as_str(),
            None => {
                tracing::error!("No messages provided in chat request");
                return Err(RagError::Validation("No messages provided".to_string()));
            }
        };
        tracing::info!(question = %question, "User question");

        let context = if is_greeting(question) {
            tracing::info!("Greeting detected, using natural response mode");
            GREETING_CONTEXT.to_string()
        } else {
            let context = self
                .assembler
                .retrieve_context(question, self.settings.top_k)
                .await;
            tracing::info!(length = context.len(), "Retrieved context");
            context
        };

        Ok(self.build_request(question, &context))
    }

    /// System instruction, context as an assistant turn, then the question
    pub fn build_request(&self, question: &str, context: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::assistant(context_message(context)),
                ChatMessage::user(question),
            ],
            stream: false,
            options: SamplingOptions {
                temperature: self.settings.temperature,
            },
        }
    }
}
