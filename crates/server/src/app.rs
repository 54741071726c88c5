use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json as ExtractJson, Query, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::error;
use serde_json::{json, Map, Value};

use orchestrator_core::config::{Config, LlmConfig, McpConfig, PeerServerConfig, ServerConfig};
use peers::{connect_peer, HttpPeerTransport, PeerRegistry};

use crate::errors::OrchestratorError;
use crate::models::{self, ChatQuery, EmailQuery, GenerationResponse, LoginQuery, WeatherQuery};
use crate::orchestrator::OrchestratorService;
use crate::sse::create_sse_stream;
use crate::templates;

const DEFAULT_CHAT_MESSAGE: &str = "Tell me a joke";

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn get_weather(
    State(service): State<Arc<OrchestratorService>>,
    Query(query): Query<WeatherQuery>,
) -> Result<String, OrchestratorError> {
    let args = HashMap::from([("cityName".to_string(), query.city_name)]);
    service
        .resolve_and_call_once(&templates::weather(), &args)
        .await
}

async fn get_weather_by_prompt(
    State(service): State<Arc<OrchestratorService>>,
    Query(query): Query<WeatherQuery>,
) -> Result<String, OrchestratorError> {
    let args = HashMap::from([("cityName".to_string(), query.city_name)]);
    service
        .resolve_and_call_once(&templates::weather_by_city_name(), &args)
        .await
}

async fn create_user(
    State(service): State<Arc<OrchestratorService>>,
    ExtractJson(body): ExtractJson<Map<String, Value>>,
) -> Result<String, OrchestratorError> {
    let args = models::user_args(&body);
    service
        .resolve_and_call_once(&templates::create_user(), &args)
        .await
}

async fn user_by_login(
    State(service): State<Arc<OrchestratorService>>,
    Query(query): Query<LoginQuery>,
) -> Result<String, OrchestratorError> {
    let args = HashMap::from([("login".to_string(), query.login)]);
    service
        .resolve_and_call_once(&templates::get_user_by_login(), &args)
        .await
}

async fn user_by_email(
    State(service): State<Arc<OrchestratorService>>,
    Query(query): Query<EmailQuery>,
) -> Result<String, OrchestratorError> {
    let args = HashMap::from([("email".to_string(), query.email)]);
    service
        .resolve_and_call_once(&templates::get_users_by_email(), &args)
        .await
}

async fn chat(
    State(service): State<Arc<OrchestratorService>>,
    Query(query): Query<ChatQuery>,
) -> Result<Json<GenerationResponse>, OrchestratorError> {
    let message = query
        .message
        .unwrap_or_else(|| DEFAULT_CHAT_MESSAGE.to_string());
    let generation = service.chat_once(message).await?;
    Ok(Json(GenerationResponse { generation }))
}

async fn chat_stream(
    State(service): State<Arc<OrchestratorService>>,
    Query(query): Query<ChatQuery>,
) -> Result<impl IntoResponse, OrchestratorError> {
    let message = query
        .message
        .unwrap_or_else(|| DEFAULT_CHAT_MESSAGE.to_string());
    let chunks = service.chat_streaming(message).await?;
    Ok(create_sse_stream(chunks))
}

pub fn create_app(service: Arc<OrchestratorService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/weather", get(get_weather))
        .route("/weather/by-prompt", get(get_weather_by_prompt))
        .route("/user/create", post(create_user))
        .route("/user/by-login", get(user_by_login))
        .route("/user/by-email", get(user_by_email))
        .route("/chat", get(chat))
        .route("/chat/stream", get(chat_stream))
        .with_state(service)
}

/// Connects every configured peer, registering it Connected or Disconnected
/// depending on how discovery went.
pub async fn connect_configured_peers(registry: &PeerRegistry, mcp: &McpConfig) {
    let timeout = Duration::from_secs(mcp.discovery_timeout_secs);

    for server in &mcp.servers {
        match HttpPeerTransport::for_endpoint(&server.url) {
            Ok(transport) => {
                let peer = connect_peer(server, Arc::new(transport), timeout).await;
                registry.register(peer);
            }
            Err(e) => error!("failed to create transport for peer '{}': {}", server.name, e),
        }
    }
}

pub fn create_development_config() -> Config {
    Config {
        llm: LlmConfig {
            model: "qwen2.5:7b".to_string(),
            base_url: "http://localhost:11434".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
            max_tool_rounds: 8,
        },
        mcp: McpConfig {
            discovery_timeout_secs: 10,
            prompt_timeout_secs: 10,
            tool_timeout_secs: 30,
            servers: vec![
                PeerServerConfig {
                    name: "user-mcp-server".to_string(),
                    url: "http://localhost:8081/mcp".to_string(),
                },
                PeerServerConfig {
                    name: "weather-mcp-server".to_string(),
                    url: "http://localhost:8082/mcp".to_string(),
                },
            ],
        },
        server: ServerConfig {
            bind_addr: "0.0.0.0:3000".to_string(),
        },
    }
}
