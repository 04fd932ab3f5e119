//! # Edge Router
//!
//! Forwards payment-session and x402 requests to the upstream payment
//! service and serves the payment pages.
//!
//! ```bash
//! SERVICE=https://api.zpaynow.com APIKEY=... ASSETS_DIR=./public edge-router
//! ```

use edge_api::{routes, AppConfig, AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_tracing(config.is_production());
    let state = AppState::from_config(config)?;

    let addr = state.config.socket_addr()?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %state.config.environment,
        products = state.env.catalog.len(),
        routes = state.dispatcher.routes().len(),
        "Edge router listening on http://{}",
        addr
    );

    let app = routes::create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// JSON lines in production, human-readable otherwise
fn init_tracing(json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
