use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use llm::{ChatMessage, ChatModel, EventStream, StreamEvent};
use orchestrator_core::config::McpConfig;
use orchestrator_core::Role;
use peers::{Peer, PeerError, PeerInfo, PeerRegistry, PeerTransport, PromptMessage, ToolSpec};
use serde_json::{json, Value};
use server::app::create_app;
use server::orchestrator::OrchestratorService;
use tooling::CallbackSet;
use tower::ServiceExt;

/// Model double that echoes the prompt it was handed, so tests can assert
/// on the fully resolved text that reached the model layer.
struct EchoModel;

#[async_trait]
impl ChatModel for EchoModel {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _tools: Option<&CallbackSet>,
    ) -> anyhow::Result<String> {
        Ok(format!("ANSWER: {}", messages.last().unwrap().content))
    }

    async fn stream(&self, _messages: Vec<ChatMessage>) -> anyhow::Result<EventStream> {
        Ok(Box::pin(futures::stream::iter(vec![
            Ok(StreamEvent::Delta {
                text: "He".to_string(),
            }),
            Ok(StreamEvent::Delta {
                text: "llo".to_string(),
            }),
            Ok(StreamEvent::Done),
        ])))
    }
}

struct WeatherTransport;

#[async_trait]
impl PeerTransport for WeatherTransport {
    async fn discover(&self) -> Result<PeerInfo, PeerError> {
        unreachable!("peers are registered directly in these tests")
    }

    async fn get_prompt(
        &self,
        _name: &str,
        _args: &HashMap<String, String>,
    ) -> Result<Vec<PromptMessage>, PeerError> {
        Ok(vec![PromptMessage::text(Role::User, "Weather in {cityName}?")])
    }

    async fn call_tool(&self, _name: &str, _args: Value) -> Result<Value, PeerError> {
        Ok(json!("sunny, 21C"))
    }
}

fn test_mcp_config() -> McpConfig {
    McpConfig {
        discovery_timeout_secs: 1,
        prompt_timeout_secs: 1,
        tool_timeout_secs: 1,
        servers: Vec::new(),
    }
}

fn app_with_weather_peer() -> Router {
    let registry = Arc::new(PeerRegistry::new());
    registry.register(Peer::connected(
        "weather-mcp-server",
        vec![ToolSpec {
            name: "getWeather".to_string(),
            description: "Get weather information by city name".to_string(),
            input_schema: json!({"type": "object"}),
        }],
        Arc::new(WeatherTransport),
    ));
    let service = Arc::new(OrchestratorService::new(
        registry,
        Arc::new(EchoModel),
        &test_mcp_config(),
    ));
    create_app(service)
}

fn app_without_peers() -> Router {
    let registry = Arc::new(PeerRegistry::new());
    let service = Arc::new(OrchestratorService::new(
        registry,
        Arc::new(EchoModel),
        &test_mcp_config(),
    ));
    create_app(service)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn should_answer_weather_via_static_template() {
    let app = app_with_weather_peer();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/weather?cityName=%E5%8C%97%E4%BA%AC")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        "ANSWER: What's the weather like in 北京 today?\n"
    );
}

#[tokio::test]
async fn should_answer_weather_via_peer_prompt_with_two_stage_substitution() {
    let app = app_with_weather_peer();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/weather/by-prompt?cityName=%E5%8C%97%E4%BA%AC")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ANSWER: Weather in 北京?");
}

#[tokio::test]
async fn should_return_not_found_when_weather_peer_is_not_registered() {
    let app = app_without_peers();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/weather/by-prompt?cityName=%E5%8C%97%E4%BA%AC")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("weather-mcp-server"));
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn should_create_user_through_prompt_template() {
    let app = app_with_weather_peer();

    let payload = json!({
        "login": "louis",
        "password": "s3cret",
        "firstName": "Louis",
        "lastName": "Wang",
        "email": "louis@example.com",
        "age": 30
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/user/create")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.starts_with("ANSWER: Please create a user"));
    assert!(body.contains("login: louis"));
    assert!(body.contains("age: 30"));
}

#[tokio::test]
async fn should_reject_user_creation_with_missing_field() {
    let app = app_with_weather_peer();

    let payload = json!({"login": "louis"});

    let response = app
        .oneshot(
            Request::builder()
                .uri("/user/create")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Missing argument"));
}

#[tokio::test]
async fn should_look_up_user_by_login() {
    let app = app_with_weather_peer();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/user/by-login?login=louis")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        "ANSWER: Please look up the user whose login is louis.\n"
    );
}

#[tokio::test]
async fn should_look_up_users_by_email() {
    let app = app_with_weather_peer();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/user/by-email?email=louis%40example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        "ANSWER: Please look up all users whose email is louis@example.com.\n"
    );
}

#[tokio::test]
async fn should_answer_chat_as_json_generation() {
    let app = app_with_weather_peer();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/chat?message=Hi")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["generation"], "ANSWER: Hi");
}

#[tokio::test]
async fn should_stream_chat_response_as_sse() {
    let app = app_with_weather_peer();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/chat/stream?message=Hi")
                .header("accept", "text/event-stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let content = body_string(response).await;
    assert!(content.contains("event: content_delta"));
    assert!(content.contains("He"));
    assert!(content.contains("llo"));
    assert!(content.contains("event: stream_end"));

    // Chunks arrive in model order.
    let he = content.find("He").unwrap();
    let llo = content.find("llo").unwrap();
    assert!(he < llo);
}
