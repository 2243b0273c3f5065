mod booklet;
mod config;
mod errors;
mod layout;
mod models;
mod persistence;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::persistence::{HttpOrderStore, InMemoryOrderStore, OrderStore};
use crate::routes::build_router;
use crate::state::{spawn_session_sweeper, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Booklet API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the order store
    let store: Arc<dyn OrderStore> = match &config.backend_url {
        Some(url) => {
            info!("Saving order to backend at {url}");
            Arc::new(HttpOrderStore::new(url))
        }
        None => {
            warn!("BACKEND_URL not set; order saves are kept in memory only");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    let sheet = config.sheet_config();
    info!(
        "Sheet config: column capacity {} (margin {}), unmeasured blocks {:?}",
        sheet.column_capacity, sheet.safety_margin, sheet.failure_policy
    );

    // Build app state
    let state = AppState::new(&config, store);
    spawn_session_sweeper(state.clone(), config.session_idle_timeout);
    info!(
        "Idle booklet sessions are dropped after {}s",
        config.session_idle_timeout.as_secs()
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the editor host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
