use std::sync::Arc;

use anyhow::Result;
use citizens::config::{ConfigLoader, RegistryConfig};
use citizens::logging;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use citizens_server::cli::CliArgs;
use citizens_server::config::ServerConfig;
use citizens_server::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli_args = CliArgs::parse();

    let mut registry_config = load_registry_config(&cli_args)?;
    if let Some(level) = &cli_args.log_level {
        registry_config.logging.level = logging::parse_log_level(level)?;
    }

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init(&registry_config.logging)?;

    info!("Starting citizens server v{}", citizens::VERSION);

    let server_config = ServerConfig::from_cli_and_env(&cli_args)?;
    info!(
        backend = %registry_config.storage.backend,
        max_request_size = server_config.max_request_size,
        "Configuration loaded"
    );

    let registry = citizens::init(registry_config).await?;
    let state = Arc::new(AppState::new(registry, server_config.clone()));

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr = server_config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);
    info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Registry configuration from `--config`, or from the default files, with
/// environment variables on top.
fn load_registry_config(cli_args: &CliArgs) -> Result<RegistryConfig> {
    let mut loader = ConfigLoader::new();
    match &cli_args.config_file {
        Some(path) => {
            loader.load_file(path)?;
        }
        None => {
            loader.load_default_files();
        }
    }
    Ok(loader.load_env().extract()?)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
