use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use orchestrator_core::template::{placeholders, render};
use orchestrator_core::Message;
use peers::{PeerError, PeerRegistry, PromptMessage};

use crate::errors::OrchestratorError;
use crate::templates::PromptTemplate;

/// Fully substituted prompt content, ready for dispatch. Immutable once
/// produced; no placeholders remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    text: String,
    messages: Vec<Message>,
}

impl ResolvedPrompt {
    pub(crate) fn new(text: String, messages: Vec<Message>) -> Self {
        Self { text, messages }
    }

    /// Wraps raw caller text as a single user message, without any
    /// substitution pass. Used by the pass-through chat endpoints.
    pub fn from_user_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let messages = vec![Message::user(text.clone())];
        Self::new(text, messages)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
}

/// Resolves a template to prompt text, either locally or by querying the
/// referenced peer for a dynamically generated prompt.
pub struct PromptResolver {
    registry: Arc<PeerRegistry>,
    prompt_timeout: Duration,
}

impl PromptResolver {
    pub fn new(registry: Arc<PeerRegistry>, prompt_timeout: Duration) -> Self {
        Self {
            registry,
            prompt_timeout,
        }
    }

    pub async fn resolve(
        &self,
        template: &PromptTemplate,
        args: &HashMap<String, String>,
    ) -> Result<ResolvedPrompt, OrchestratorError> {
        match template {
            PromptTemplate::Static(text) => self.resolve_static(text, args),
            PromptTemplate::Remote {
                peer_name,
                prompt_name,
            } => self.resolve_remote(peer_name, prompt_name, args).await,
        }
    }

    fn resolve_static(
        &self,
        text: &str,
        args: &HashMap<String, String>,
    ) -> Result<ResolvedPrompt, OrchestratorError> {
        let known = placeholders(text);
        let unused: Vec<&str> = args
            .keys()
            .filter(|key| !known.iter().any(|name| name == *key))
            .map(String::as_str)
            .collect();
        if !unused.is_empty() {
            warn!("arguments not used by the template: {}", unused.join(", "));
        }

        let rendered = render(text, args)?;
        let messages = vec![Message::user(rendered.clone())];
        Ok(ResolvedPrompt::new(rendered, messages))
    }

    async fn resolve_remote(
        &self,
        peer_name: &str,
        prompt_name: &str,
        args: &HashMap<String, String>,
    ) -> Result<ResolvedPrompt, OrchestratorError> {
        let peer = self
            .registry
            .peer_by_name(peer_name)
            .filter(|peer| peer.is_connected())
            .ok_or_else(|| OrchestratorError::PeerNotFound(peer_name.to_string()))?;

        let transport = peer.transport();
        let fetch = transport.get_prompt(prompt_name, args);
        let messages = match tokio::time::timeout(self.prompt_timeout, fetch).await {
            Ok(Ok(messages)) => messages,
            Ok(Err(PeerError::Timeout)) => {
                return Err(OrchestratorError::PeerTimeout(peer_name.to_string()))
            }
            Ok(Err(e)) => return Err(OrchestratorError::PeerTransport(e.to_string())),
            Err(_) => return Err(OrchestratorError::PeerTimeout(peer_name.to_string())),
        };

        let first = messages
            .first()
            .ok_or(OrchestratorError::EmptyPromptResponse)?;
        let structure = first
            .content
            .as_text()
            .ok_or(OrchestratorError::EmptyPromptResponse)?;

        // The peer returns prompt structure; the caller's arguments fill it.
        // The returned text is itself a template, so the same argument set
        // gets a second substitution pass here.
        let rendered = render(structure, args)?;

        let mut resolved = vec![Message {
            role: first.role,
            content: rendered.clone(),
        }];
        resolved.extend(trailing_text_messages(&messages[1..]));

        Ok(ResolvedPrompt::new(rendered, resolved))
    }
}

fn trailing_text_messages(messages: &[PromptMessage]) -> Vec<Message> {
    messages
        .iter()
        .filter_map(|m| {
            m.content.as_text().map(|text| Message {
                role: m.role,
                content: text.to_string(),
            })
        })
        .collect()
}
