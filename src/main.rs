//! Portico binary entry point

use portico::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load configuration from .env and the environment
/// 2. Initialize tracing/logging
/// 3. Initialize AppState (templates, OIDC provider)
/// 4. Build the axum router
/// 5. Start the HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::AppConfig::load()?;

    let default_filter = if config.debug {
        "portico=debug,tower_http=debug"
    } else {
        "portico=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        debug = config.debug,
        templates = %config.templates.display(),
        statics = %config.static_dir.display(),
        "Starting Portico..."
    );

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config)?;
    let app = portico::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
