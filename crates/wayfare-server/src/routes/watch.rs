//! Watch endpoints: the cron-style pass trigger and a listing view.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use wayfare_core::normalize_user_id;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/watch/run", post(run_pass))
        .route("/watch/{waid}", get(list_watches))
}

#[derive(Deserialize)]
struct RunQuery {
    key: Option<String>,
}

/// POST /api/watch/run?key=… — one poll pass, triggered by an external
/// timer. Guarded by the shared cron secret.
async fn run_pass(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RunQuery>,
) -> impl IntoResponse {
    if query.key.as_deref() != Some(state.config.cron_secret.as_str()) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"ok": false, "error": "bad key"})),
        );
    }
    let report = state.assistant.run_watch_pass().await;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "total": report.total,
            "updated": report.updated,
            "errors": report.errors,
        })),
    )
}

/// GET /api/watch/{waid} — the owner's subscriptions, newest first.
async fn list_watches(
    State(state): State<Arc<AppState>>,
    Path(waid): Path<String>,
) -> impl IntoResponse {
    let waid = normalize_user_id(&waid);
    match state.assistant.store().list_watches(&waid) {
        Ok(watches) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "watches": watches})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"ok": false, "error": e.to_string()})),
        ),
    }
}
