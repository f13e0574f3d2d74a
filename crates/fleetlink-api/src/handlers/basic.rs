//! Basic handlers - server status and freshness.

use axum::{Json, extract::State};
use serde_json::json;

use super::ServerState;

/// Liveness check (public endpoint).
///
/// GET /api/status
pub async fn status_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "Server is running",
        "service": "fleetlink",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// The timestamp of the most recent machine or operation change.
///
/// GET /api/lastUpdate
pub async fn last_update_handler(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(json!({
        "lastUpdateTime": state.freshness.last_update().to_rfc3339(),
    }))
}
