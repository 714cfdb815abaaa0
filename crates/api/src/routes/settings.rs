//! Settings routes: read and partial-upsert of the singleton row.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use database::{settings, SettingsUpdate};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::Result;
use crate::state::AppState;

/// GET /settings — the normalized settings record.
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<Value>> {
    let record = settings::get(state.db.pool()).await?;
    Ok(Json(json!({ "ok": true, "settings": record })))
}

/// POST /settings and PUT /settings — apply a sparse patch.
///
/// The body is read leniently: an unparseable body counts as an empty patch
/// and wrong-typed fields are dropped, so no client input yields a 4xx. An
/// empty patch still refreshes the updated timestamp.
pub async fn update_settings(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>> {
    let value: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
    let update = SettingsUpdate::from_value(&value);
    debug!(?update, "applying settings patch");

    settings::upsert(state.db.pool(), &update).await?;
    Ok(Json(json!({ "ok": true })))
}
