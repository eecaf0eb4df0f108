mod artifact;
mod config;
mod error;
mod handlers;
mod predictor;
mod routes;
mod state;
mod translate;
mod utils;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ConfigSource;
use state::AppState;

/// `serve` starts the listener; with no argument the binary only
/// prepares the artifacts and exits, which lets image builds bake the
/// model in ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Prepare,
    Serve,
}

impl Mode {
    fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut mode = Mode::Prepare;
        for arg in args {
            match arg.as_str() {
                "serve" => mode = Mode::Serve,
                other => anyhow::bail!("Unknown argument `{}`; usage: pokedex-server [serve]", other),
            }
        }
        Ok(mode)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pokedex_server=debug,tower_http=debug")),
        )
        .init();

    let mode = Mode::from_args(std::env::args().skip(1))?;

    let (config, source) = config::load_config()?;
    match &source {
        ConfigSource::File(path) => info!("Loaded configuration from: {}", path),
        ConfigSource::Defaults => info!("No configuration file found, using built-in defaults"),
    }

    // Everything the handlers touch is built here, before any port is bound.
    let app_state = AppState::new(config).await?;

    if mode == Mode::Prepare {
        info!("Artifacts ready; pass `serve` to start the server");
        return Ok(());
    }

    let server_config = app_state.config.server_config.clone();
    let app = routes::build_app(app_state);

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
