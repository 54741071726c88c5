use std::sync::Arc;

use log::{info, warn};

use llm::{ModelConfig, OllamaClient};
use orchestrator_core::config::Config;
use peers::PeerRegistry;
use server::app::{connect_configured_peers, create_app, create_development_config};
use server::orchestrator::OrchestratorService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set default log level if not already set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting MCP orchestrator server");

    let config = Config::load_from_env().unwrap_or_else(|_| {
        warn!("Warning: Could not load config, using development defaults");
        create_development_config()
    });

    let llm_cfg = config.llm.with_env_overrides();
    let model = Arc::new(OllamaClient::new(ModelConfig::from(&llm_cfg))?);

    let registry = Arc::new(PeerRegistry::new());
    connect_configured_peers(&registry, &config.mcp).await;
    info!("{} peers registered", registry.count());

    let service = Arc::new(OrchestratorService::new(registry, model, &config.mcp));
    let app = create_app(service);

    let bind_addr = config.server.with_env_overrides().bind_addr;
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind to address");

    info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");

    Ok(())
}
