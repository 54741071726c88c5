use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use orchestrator_core::Role;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::transport::{
    PeerError, PeerInfo, PeerTransport, PromptContent, PromptMessage, ToolSpec,
};

#[derive(Debug, Clone)]
pub struct HttpPeerConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpPeerConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// JSON-RPC 2.0 client for one peer endpoint.
///
/// Read-only methods (`initialize`, `tools/list`, `prompts/get`) are retried
/// with exponential backoff; `tools/call` is issued exactly once.
pub struct HttpPeerTransport {
    config: HttpPeerConfig,
    client: Client,
    next_id: AtomicU64,
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    server_info: ServerInfo,
}

#[derive(Debug, Deserialize)]
struct ServerInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ListToolsResult {
    tools: Vec<WireTool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTool {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "empty_object")]
    input_schema: Value,
}

fn empty_object() -> Value {
    json!({})
}

#[derive(Debug, Deserialize)]
struct GetPromptResult {
    messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: String,
    content: WireContent,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireContent {
    Text { text: String },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallToolResult {
    #[serde(default)]
    content: Vec<Value>,
    #[serde(default)]
    is_error: bool,
}

impl HttpPeerTransport {
    pub fn new(config: HttpPeerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn for_endpoint(endpoint: &str) -> Result<Self> {
        Self::new(HttpPeerConfig {
            endpoint: endpoint.to_string(),
            ..HttpPeerConfig::default()
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, PeerError> {
        // Reads are safe to repeat; tool calls are not.
        let retries = if method == "tools/call" {
            0
        } else {
            self.config.max_retries
        };

        let mut last_error = None;

        for attempt in 0..=retries {
            match self.try_rpc(method, params.clone()).await {
                Ok(result) => return Ok(result),
                Err(PeerError::Timeout) => return Err(PeerError::Timeout),
                // A definitive peer answer will not change on a resend.
                Err(e @ PeerError::Protocol(_)) => return Err(e),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < retries {
                        let delay = Duration::from_millis(500 * (2_u64.pow(attempt)));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PeerError::Transport("no attempt made".to_string())))
    }

    async fn try_rpc(&self, method: &str, params: Value) -> Result<Value, PeerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        debug!(endpoint = %self.config.endpoint, method, "sending peer request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PeerError::Timeout
                } else {
                    PeerError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PeerError::Transport(format!(
                "peer returned HTTP {}: {}",
                status, body
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| PeerError::Protocol(format!("invalid JSON-RPC response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(PeerError::Protocol(format!(
                "peer error {}: {}",
                error.code, error.message
            )));
        }

        body.result
            .ok_or_else(|| PeerError::Protocol("response carries neither result nor error".into()))
    }
}

fn parse_role(role: &str) -> Role {
    match role {
        "assistant" => Role::Assistant,
        _ => Role::User,
    }
}

fn parse_prompt_messages(result: Value) -> Result<Vec<PromptMessage>, PeerError> {
    let parsed: GetPromptResult = serde_json::from_value(result)
        .map_err(|e| PeerError::Protocol(format!("invalid prompts/get result: {}", e)))?;

    Ok(parsed
        .messages
        .into_iter()
        .map(|m| PromptMessage {
            role: parse_role(&m.role),
            content: match m.content {
                WireContent::Text { text } => PromptContent::Text(text),
                WireContent::Unsupported => PromptContent::Other("non-text".to_string()),
            },
        })
        .collect())
}

fn parse_tool_result(result: Value) -> Result<Value, PeerError> {
    let parsed: CallToolResult = serde_json::from_value(result)
        .map_err(|e| PeerError::Protocol(format!("invalid tools/call result: {}", e)))?;

    let text: Vec<&str> = parsed
        .content
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|item| item.get("text").and_then(Value::as_str))
        .collect();
    let joined = text.join("\n");

    if parsed.is_error {
        return Err(PeerError::Protocol(format!(
            "tool reported an error: {}",
            joined
        )));
    }

    if text.is_empty() {
        Ok(Value::Array(parsed.content))
    } else {
        Ok(Value::String(joined))
    }
}

#[async_trait::async_trait]
impl PeerTransport for HttpPeerTransport {
    async fn discover(&self) -> Result<PeerInfo, PeerError> {
        let init = self
            .rpc(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "mcp-orchestrator", "version": env!("CARGO_PKG_VERSION")},
                }),
            )
            .await?;

        let init: InitializeResult = serde_json::from_value(init)
            .map_err(|e| PeerError::Protocol(format!("invalid initialize result: {}", e)))?;

        let tools = self.rpc("tools/list", json!({})).await?;
        let tools: ListToolsResult = serde_json::from_value(tools)
            .map_err(|e| PeerError::Protocol(format!("invalid tools/list result: {}", e)))?;

        Ok(PeerInfo {
            name: init.server_info.name,
            tools: tools
                .tools
                .into_iter()
                .map(|t| ToolSpec {
                    name: t.name,
                    description: t.description,
                    input_schema: t.input_schema,
                })
                .collect(),
        })
    }

    async fn get_prompt(
        &self,
        name: &str,
        args: &HashMap<String, String>,
    ) -> Result<Vec<PromptMessage>, PeerError> {
        let result = self
            .rpc("prompts/get", json!({"name": name, "arguments": args}))
            .await?;
        parse_prompt_messages(result)
    }

    async fn call_tool(&self, name: &str, args: Value) -> Result<Value, PeerError> {
        let result = self
            .rpc("tools/call", json!({"name": name, "arguments": args}))
            .await?;
        parse_tool_result(result)
    }
}
