use orchestrator_core::config::LlmConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessage {
    pub fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
            tool_calls: None,
        }
    }

    pub fn assistant(content: String) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_calls: None,
        }
    }

    pub fn tool(content: String) -> Self {
        Self {
            role: "tool".to_string(),
            content,
            tool_calls: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCallFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_tool_rounds: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "qwen2.5:7b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
            max_tool_rounds: 8,
        }
    }
}

impl From<&LlmConfig> for ModelConfig {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            base_url: cfg.base_url.clone(),
            temperature: cfg.temperature,
            timeout_secs: cfg.timeout_secs,
            max_tool_rounds: cfg.max_tool_rounds,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StreamEvent {
    Delta { text: String },
    Done,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    pub options: ChatOptions,
}

#[derive(Debug, Serialize)]
pub struct ChatOptions {
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ResponseMessage,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub message: StreamMessage,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamMessage {
    #[serde(default)]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_create_user_message() {
        let msg = ChatMessage::user("Hello".to_string());
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_none());
    }

    #[test]
    fn should_create_assistant_message() {
        let msg = ChatMessage::assistant("Hi there".to_string());
        assert_eq!(msg.role, "assistant");
        assert_eq!(msg.content, "Hi there");
    }

    #[test]
    fn should_create_tool_message() {
        let msg = ChatMessage::tool("21C, sunny".to_string());
        assert_eq!(msg.role, "tool");
        assert_eq!(msg.content, "21C, sunny");
    }

    #[test]
    fn should_omit_tool_calls_when_serializing_plain_message() {
        let json = serde_json::to_string(&ChatMessage::user("Hello".to_string())).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(!json.contains("tool_calls"));
    }

    #[test]
    fn should_create_default_model_config() {
        let config = ModelConfig::default();
        assert_eq!(config.model, "qwen2.5:7b");
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.max_tool_rounds, 8);
    }

    #[test]
    fn should_build_model_config_from_settings() {
        let settings = LlmConfig {
            model: "llama3.1:8b".to_string(),
            base_url: "http://ollama:11434".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
            max_tool_rounds: 4,
        };

        let config = ModelConfig::from(&settings);
        assert_eq!(config.model, "llama3.1:8b");
        assert_eq!(config.base_url, "http://ollama:11434");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_tool_rounds, 4);
    }

    #[test]
    fn should_serialize_chat_request_without_tools() {
        let request = ChatRequest {
            model: "qwen2.5:7b".to_string(),
            messages: vec![ChatMessage::user("Test".to_string())],
            stream: false,
            tools: None,
            options: ChatOptions { temperature: 0.7 },
        };

        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(encoded["model"], "qwen2.5:7b");
        assert_eq!(encoded["stream"], false);
        assert!(encoded.get("tools").is_none());
        assert_eq!(encoded["options"]["temperature"], 0.7);
    }

    #[test]
    fn should_serialize_tool_definition_with_function_tag() {
        let definition = ToolDefinition {
            kind: "function",
            function: FunctionDefinition {
                name: "getWeather".to_string(),
                description: "Get weather information by city name".to_string(),
                parameters: json!({"type": "object"}),
            },
        };

        let encoded = serde_json::to_value(&definition).unwrap();
        assert_eq!(encoded["type"], "function");
        assert_eq!(encoded["function"]["name"], "getWeather");
    }

    #[test]
    fn should_deserialize_chat_response_with_tool_calls() {
        let body = json!({
            "model": "qwen2.5:7b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "getWeather", "arguments": {"cityName": "北京"}}}
                ]
            },
            "done": true
        });

        let response: ChatResponse = serde_json::from_value(body).unwrap();
        let calls = response.message.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.name, "getWeather");
        assert_eq!(calls[0].function.arguments["cityName"], "北京");
    }

    #[test]
    fn should_deserialize_plain_chat_response() {
        let body = json!({
            "message": {"role": "assistant", "content": "Hello!"},
            "done": true
        });

        let response: ChatResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.message.content, "Hello!");
        assert!(response.message.tool_calls.is_none());
    }

    #[test]
    fn should_deserialize_stream_chunk() {
        let chunk: StreamChunk =
            serde_json::from_str(r#"{"message":{"content":"He"},"done":false}"#).unwrap();
        assert_eq!(chunk.message.content, "He");
        assert!(!chunk.done);

        let last: StreamChunk = serde_json::from_str(r#"{"done":true}"#).unwrap();
        assert_eq!(last.message.content, "");
        assert!(last.done);
    }
}
