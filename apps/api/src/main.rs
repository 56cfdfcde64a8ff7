mod config;
mod errors;
mod formatter;
mod models;
mod preview;
mod queue;
mod routes;
mod session;
mod state;
mod store;
mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::queue::HttpQueueClient;
use crate::routes::build_router;
use crate::session::SessionManager;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Dossier API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize queue client
    let queue = Arc::new(HttpQueueClient::new(config.queue_api_url.clone()));
    info!("Queue client initialized ({})", config.queue_api_url);

    let poll = config.poll_config();
    info!(
        "Generation polling: interval {:?}, deadline {:?}",
        poll.interval, poll.deadline
    );

    // Build app state
    let state = AppState {
        sessions: SessionManager::new(),
        queue,
        config: config.clone(),
        poll,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
