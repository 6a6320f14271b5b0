use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_api::{build_router, cache::CacheClient, config::Config, state::AppState};
use parley_llm::LlmRegistry;
use parley_persist::{PostgresCheckpointReader, ThreadDirectory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Parley API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Pool connects on first query; an unreachable database surfaces per request
    tracing::info!(table = %config.database.table, "Configuring checkpoint reader");
    let reader = PostgresCheckpointReader::connect_lazy(
        &config.database_url,
        &config.database.table,
        config.database.max_connections,
    )?;
    let threads = ThreadDirectory::new(Arc::new(reader));

    tracing::info!(host = %config.cache.host, port = config.cache.port, "Configuring cache client");
    let cache = CacheClient::new(config.cache.clone());

    let llm = LlmRegistry::new(config.llm.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, threads, cache, llm));

    // A misconfigured chat model is fatal at startup
    let agent = state
        .agent()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to assemble chat agent: {}", e))?;
    tracing::info!(
        provider = %agent.model.provider,
        model = %agent.model.model,
        tools = ?agent.tools,
        "Chat agent assembled"
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
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
