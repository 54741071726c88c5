use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use llm::{ChatMessage, ChatModel, StreamEvent};
use orchestrator_core::Role;
use tooling::CallbackSet;

use crate::errors::OrchestratorError;
use crate::resolver::ResolvedPrompt;

/// Lazy, finite, non-restartable sequence of partial response chunks.
/// Dropping it cancels the underlying model request.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, OrchestratorError>> + Send>>;

/// Hands resolved prompts to the model-invocation layer, either as one
/// blocking call or as a chunk stream.
pub struct Dispatcher {
    model: Arc<dyn ChatModel>,
}

impl Dispatcher {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Blocks until the model returns one complete answer. The callback set
    /// is passed through so the model layer may invoke tools on its own;
    /// the tool loop itself lives there.
    pub async fn call_once(
        &self,
        prompt: &ResolvedPrompt,
        tools: Option<&CallbackSet>,
    ) -> Result<String, OrchestratorError> {
        self.model
            .complete(to_chat_messages(prompt), tools)
            .await
            .map_err(invocation_failed)
    }

    pub async fn call_streaming(
        &self,
        prompt: &ResolvedPrompt,
    ) -> Result<ChunkStream, OrchestratorError> {
        let mut events = self
            .model
            .stream(to_chat_messages(prompt))
            .await
            .map_err(invocation_failed)?;

        Ok(Box::pin(async_stream::stream! {
            while let Some(event) = events.next().await {
                match event {
                    Ok(StreamEvent::Delta { text }) => yield Ok(text),
                    Ok(StreamEvent::Done) => return,
                    Err(e) => {
                        // Faults terminate the stream as errors, never as a
                        // silent empty completion.
                        yield Err(invocation_failed(e));
                        return;
                    }
                }
            }
        }))
    }
}

fn invocation_failed(err: anyhow::Error) -> OrchestratorError {
    OrchestratorError::InvocationFailed(format!("{:#}", err))
}

fn to_chat_messages(prompt: &ResolvedPrompt) -> Vec<ChatMessage> {
    prompt
        .messages()
        .iter()
        .map(|message| match message.role {
            Role::User => ChatMessage::user(message.content.clone()),
            Role::Assistant => ChatMessage::assistant(message.content.clone()),
            Role::Tool => ChatMessage::tool(message.content.clone()),
        })
        .collect()
}
