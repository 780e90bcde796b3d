use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lunar_api::{config::Config, routes::build_router, state::AppState};
use lunar_llm::{CompletionClient, GeminiClient};
use lunar_persist::DbGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config =
        Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Lunar Liao API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    if config.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is not set; every generation request will fail");
    }

    // Initialize completion client
    let llm: Arc<dyn CompletionClient> = Arc::new(GeminiClient::new(config.gemini_api_key.clone())?);

    // Database gateway connects lazily; warm it up here so a reachable
    // database is reported at startup, but an unreachable one only degrades.
    let gateway = DbGateway::new(config.mongodb_uri.clone(), config.mongodb.database.clone());
    match gateway.connect().await {
        Ok(_) => tracing::info!("MongoDB connected"),
        Err(e) => tracing::warn!("MongoDB unreachable at startup, serving offline: {}", e),
    }

    // Create application state
    let state = Arc::new(AppState::new(config.clone(), gateway, llm));

    // Build router
    let app = build_router(state.clone());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
