use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use llm::ChatModel;
use log::info;
use orchestrator_core::config::McpConfig;
use peers::PeerRegistry;
use tooling::CallbackSet;
use uuid::Uuid;

use crate::dispatch::{ChunkStream, Dispatcher};
use crate::errors::OrchestratorError;
use crate::resolver::{PromptResolver, ResolvedPrompt};
use crate::templates::PromptTemplate;

/// The three logical operations behind the HTTP controllers: resolve a
/// prompt and dispatch it once, resolve and dispatch as a stream, and
/// aggregate the connected peers' tools for the model layer.
pub struct OrchestratorService {
    registry: Arc<PeerRegistry>,
    resolver: PromptResolver,
    dispatcher: Dispatcher,
    tool_timeout: Duration,
}

impl OrchestratorService {
    pub fn new(registry: Arc<PeerRegistry>, model: Arc<dyn ChatModel>, mcp: &McpConfig) -> Self {
        let resolver = PromptResolver::new(
            Arc::clone(&registry),
            Duration::from_secs(mcp.prompt_timeout_secs),
        );
        Self {
            registry,
            resolver,
            dispatcher: Dispatcher::new(model),
            tool_timeout: Duration::from_secs(mcp.tool_timeout_secs),
        }
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    /// Folds every connected peer's advertised tools into one callback set.
    /// Consumed by the model layer's tool-calling configuration.
    pub fn aggregated_tools(&self) -> CallbackSet {
        CallbackSet::build(&self.registry.list_peers(), self.tool_timeout)
    }

    pub async fn resolve_and_call_once(
        &self,
        template: &PromptTemplate,
        args: &HashMap<String, String>,
    ) -> Result<String, OrchestratorError> {
        let request_id = Uuid::new_v4();
        info!("[{}] resolving prompt", request_id);

        // Resolution must finish before dispatch starts; no pipelining
        // across this boundary.
        let prompt = self.resolver.resolve(template, args).await?;
        let tools = self.aggregated_tools();

        info!(
            "[{}] dispatching with {} aggregated tools",
            request_id,
            tools.len()
        );
        self.dispatcher.call_once(&prompt, Some(&tools)).await
    }

    pub async fn resolve_and_call_streaming(
        &self,
        template: &PromptTemplate,
        args: &HashMap<String, String>,
    ) -> Result<ChunkStream, OrchestratorError> {
        let request_id = Uuid::new_v4();
        info!("[{}] resolving prompt for streaming", request_id);

        let prompt = self.resolver.resolve(template, args).await?;
        self.dispatcher.call_streaming(&prompt).await
    }

    /// Pass-through single call: the caller's text goes to the model as-is,
    /// with the aggregated tools available.
    pub async fn chat_once(&self, message: String) -> Result<String, OrchestratorError> {
        let prompt = ResolvedPrompt::from_user_text(message);
        let tools = self.aggregated_tools();
        self.dispatcher.call_once(&prompt, Some(&tools)).await
    }

    pub async fn chat_streaming(&self, message: String) -> Result<ChunkStream, OrchestratorError> {
        let prompt = ResolvedPrompt::from_user_text(message);
        self.dispatcher.call_streaming(&prompt).await
    }
}
