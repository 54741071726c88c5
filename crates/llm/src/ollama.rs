use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::StreamExt;
use log::{info, warn};
use reqwest::Client;
use serde_json::Value;
use tooling::CallbackSet;

use crate::models::{
    ChatMessage, ChatOptions, ChatRequest, ChatResponse, FunctionDefinition, ModelConfig,
    StreamChunk, StreamEvent, ToolDefinition,
};
use crate::EventStream;

/// Chat client for an Ollama server (`/api/chat`).
///
/// Single completions run a bounded tool-execution loop when a callback set
/// is supplied; streaming completions carry no tools and yield raw text
/// deltas.
pub struct OllamaClient {
    config: ModelConfig,
    client: Client,
}

impl OllamaClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        // No whole-request timeout here: it would cut long streams short.
        // Non-streaming calls set one per request.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<&CallbackSet>,
    ) -> Result<String> {
        let definitions = tools.map(tool_definitions);
        let mut conversation = messages;

        for _round in 0..=self.config.max_tool_rounds {
            let response = self
                .send_chat(conversation.clone(), definitions.clone(), false)
                .await?;

            let calls = response.message.tool_calls.unwrap_or_default();
            let set = match (tools, calls.is_empty()) {
                (Some(set), false) => set,
                _ => return Ok(response.message.content),
            };

            let mut echo = ChatMessage::assistant(response.message.content);
            echo.tool_calls = Some(calls.clone());
            conversation.push(echo);

            for call in calls {
                info!("model requested tool '{}'", call.function.name);
                let content = match set
                    .invoke(&call.function.name, call.function.arguments.clone())
                    .await
                {
                    Ok(result) => stringify_result(result),
                    Err(e) => {
                        // The failure goes back into the conversation so the
                        // model can report it; it is never dropped.
                        warn!("tool '{}' failed: {}", call.function.name, e);
                        format!("ERROR: {}", e)
                    }
                };
                conversation.push(ChatMessage::tool(content));
            }
        }

        bail!(
            "model did not produce a final answer within {} tool rounds",
            self.config.max_tool_rounds
        )
    }

    pub async fn chat_stream(&self, messages: Vec<ChatMessage>) -> Result<EventStream> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: true,
            tools: None,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.base_url))
            .json(&request)
            .send()
            .await
            .context("Failed to send streaming request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Ollama returned error {}: {}", status, body);
        }

        let mut bytes = response.bytes_stream();

        Ok(Box::pin(async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(anyhow::anyhow!("stream error: {}", e));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(line) = drain_line(&mut buffer) {
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_slice::<StreamChunk>(&line) {
                        Ok(parsed) => {
                            if !parsed.message.content.is_empty() {
                                yield Ok(StreamEvent::Delta { text: parsed.message.content });
                            }
                            if parsed.done {
                                yield Ok(StreamEvent::Done);
                                return;
                            }
                        }
                        Err(e) => {
                            yield Err(anyhow::anyhow!("invalid stream chunk: {}", e));
                            return;
                        }
                    }
                }
            }

            // Connection closed without a done marker; the sequence is still
            // finite, so terminate it cleanly.
            yield Ok(StreamEvent::Done);
        }))
    }

    async fn send_chat(
        &self,
        messages: Vec<ChatMessage>,
        tools: Option<Vec<ToolDefinition>>,
        stream: bool,
    ) -> Result<ChatResponse> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            stream,
            tools,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.config.base_url))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Ollama returned error {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse Ollama response")
    }
}

fn tool_definitions(set: &CallbackSet) -> Vec<ToolDefinition> {
    set.descriptors()
        .into_iter()
        .map(|descriptor| ToolDefinition {
            kind: "function",
            function: FunctionDefinition {
                name: descriptor.name.clone(),
                description: descriptor.description.clone(),
                parameters: descriptor.parameters.clone(),
            },
        })
        .collect()
}

fn stringify_result(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

fn drain_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let newline = buffer.iter().position(|b| *b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=newline).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(line)
}
