//! Route handlers for the Pulse API.

pub mod health;
pub mod settings;
pub mod stream;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Settings: GET returns the row, POST and PUT apply the same
        // partial-upsert logic
        .route(
            "/settings",
            get(settings::get_settings)
                .post(settings::update_settings)
                .put(settings::update_settings),
        )
        // Heartbeat stream the chat client subscribes to
        .route("/messages/stream", get(stream::message_stream))
}
