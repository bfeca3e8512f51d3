//! Chat orchestration
//!
//! Combines the greeting check, the retrieved context and a fixed system
//! instruction into one message list, then forwards it to the chat
//! completion service.

pub mod client;
pub mod orchestrator;
pub mod prompts;
pub mod types;

pub use client::{ChatBackend, OllamaChatClient};
pub use orchestrator::{ChatOrchestrator, ChatSettings};
pub use types::{ChatCompletionRequest, ChatMessage, ChatRequest, SamplingOptions};
