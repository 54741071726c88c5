use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use tooling::CallbackSet;

pub mod models;
pub mod ollama;

pub use models::{ChatMessage, ModelConfig, StreamEvent, ToolCall};
pub use ollama::OllamaClient;

pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>;

/// The model-invocation collaborator. `complete` may drive zero or more tool
/// invocations through the supplied callback set before returning its final
/// answer; `stream` yields raw text deltas and carries no tools.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&CallbackSet>,
    ) -> Result<String>;

    async fn stream(&self, messages: Vec<ChatMessage>) -> Result<EventStream>;
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&CallbackSet>,
    ) -> Result<String> {
        self.chat(messages, tools).await
    }

    async fn stream(&self, messages: Vec<ChatMessage>) -> Result<EventStream> {
        self.chat_stream(messages).await
    }
}
