use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use orchestrator_core::TemplateError;
use tooling::ToolError;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    #[error("Peer '{0}' did not answer in time")]
    PeerTimeout(String),

    #[error("Peer transport error: {0}")]
    PeerTransport(String),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Peer returned an empty or non-text prompt response")]
    EmptyPromptResponse,

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool invocation error: {0}")]
    ToolInvocationError(String),

    #[error("Model invocation failed: {0}")]
    InvocationFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    ValidationError(String),
}

impl OrchestratorError {
    /// Returns the appropriate HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            OrchestratorError::PeerNotFound(_) => 404,
            OrchestratorError::PeerTimeout(_) => 504,
            OrchestratorError::PeerTransport(_) => 502,
            OrchestratorError::MissingArgument(_) => 400,
            OrchestratorError::EmptyPromptResponse => 502,
            OrchestratorError::ToolNotFound(_) => 404,
            OrchestratorError::ToolInvocationError(_) => 502,
            OrchestratorError::InvocationFailed(_) => 502,
            OrchestratorError::ConfigError(_) => 500,
            OrchestratorError::ValidationError(_) => 400,
        }
    }

    /// Returns true if the error is potentially recoverable with a retry.
    /// The orchestrator itself never retries; this is advice for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            OrchestratorError::PeerNotFound(_) => false,
            OrchestratorError::PeerTimeout(_) => true,
            OrchestratorError::PeerTransport(_) => true,
            OrchestratorError::MissingArgument(_) => false,
            OrchestratorError::EmptyPromptResponse => false,
            OrchestratorError::ToolNotFound(_) => false,
            OrchestratorError::ToolInvocationError(_) => true,
            // A partially completed model turn cannot be resumed.
            OrchestratorError::InvocationFailed(_) => false,
            OrchestratorError::ConfigError(_) => false,
            OrchestratorError::ValidationError(_) => false,
        }
    }
}

impl From<TemplateError> for OrchestratorError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::MissingArgument(name) => OrchestratorError::MissingArgument(name),
        }
    }
}

impl From<ToolError> for OrchestratorError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::NotFound(name) => OrchestratorError::ToolNotFound(name),
            ToolError::Invocation { .. } => OrchestratorError::ToolInvocationError(err.to_string()),
        }
    }
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "retryable": self.is_retryable(),
        }));
        (status, body).into_response()
    }
}
