use std::collections::HashMap;

use async_trait::async_trait;
use orchestrator_core::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer request timed out")]
    Timeout,

    #[error("peer transport failure: {0}")]
    Transport(String),

    #[error("peer protocol error: {0}")]
    Protocol(String),
}

/// A tool as advertised by a peer during capability discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_schema: Value,
}

/// Identity and capabilities returned by the discovery handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerInfo {
    pub name: String,
    pub tools: Vec<ToolSpec>,
}

/// Content of one message of a peer-generated prompt. Peers may return
/// non-text content (images, embedded resources); those are carried as
/// `Other` so callers can reject them explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptContent {
    Text(String),
    Other(String),
}

impl PromptContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PromptContent::Text(text) => Some(text),
            PromptContent::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: PromptContent,
}

impl PromptMessage {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: PromptContent::Text(text.into()),
        }
    }
}

/// Wire-level access to one peer. Implementations own connection details;
/// callers see only the capability protocol.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Capability-discovery round-trip: the peer's advertised identity plus
    /// its tool list.
    async fn discover(&self) -> Result<PeerInfo, PeerError>;

    /// Fetches one named dynamically generated prompt.
    async fn get_prompt(
        &self,
        name: &str,
        args: &HashMap<String, String>,
    ) -> Result<Vec<PromptMessage>, PeerError>;

    /// Invokes one named tool on the peer.
    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, PeerError>;
}
