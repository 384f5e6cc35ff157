//! Status counters.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(status))
}

/// GET /api/status — record counts and server time.
async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let counts = state.assistant.counts();
    Json(serde_json::json!({
        "ok": true,
        "flights": counts.flights,
        "hotels": counts.hotels,
        "flight_watch": counts.watches,
        "now": chrono::Utc::now().to_rfc3339(),
    }))
}
