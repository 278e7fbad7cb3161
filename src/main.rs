use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trust_gateway::config::Config;
use trust_gateway::handlers::{self, AppState};

/// Main entry point for the gateway.
///
/// Initializes logging, loads configuration from the environment, and serves
/// the analyze proxy, the registration pre-check and the health check.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trust_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let port = config.port;
    tracing::info!(
        "Forwarding analyses to {} (timeout {}s)",
        config.analysis_engine_url,
        config.analysis_timeout_secs
    );

    let app_state = Arc::new(AppState::new(config)?);
    let app = handlers::router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
