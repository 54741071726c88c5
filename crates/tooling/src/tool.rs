use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{0}' not found")]
    NotFound(String),

    #[error("tool '{name}' invocation failed: {message}")]
    Invocation { name: String, message: String },
}

impl ToolError {
    pub fn invocation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            ToolError::NotFound(name) => name,
            ToolError::Invocation { name, .. } => name,
        }
    }
}

/// A named, schema-described callable the model-invocation layer may invoke
/// while generating a response. Arguments and results are plain JSON.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}
