//! HTTP API for Pulse.
//!
//! Serves the settings endpoints backed by a single-row Postgres table and
//! the SSE heartbeat stream the chat client listens to for refresh prompts.

mod config;
mod error;
mod routes;
mod state;

use database::{settings, Database};
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting API server");

    // Connect to database and ensure the settings schema up front; the
    // handlers re-ensure it per request, so this only fails fast on a bad
    // DATABASE_URL.
    let db = Database::connect_with_pool_size(&config.database_url, config.pool_size).await?;
    settings::ensure_schema(db.pool()).await?;

    // Build application state and router
    let state = AppState::new(db);
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
