//! Typed-action endpoint. The classifier in front of this service sends
//! already-typed actions; no raw-string dispatch happens here.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use wayfare_core::normalize_user_id;
use wayfare_runtime::Action;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/actions", post(handle_action))
}

#[derive(Deserialize)]
struct ActionBody {
    waid: String,
    /// The original user message, recorded into the session when present.
    #[serde(default)]
    text: Option<String>,
    action: Action,
}

/// POST /api/actions — execute one typed action and return the reply.
async fn handle_action(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ActionBody>,
) -> impl IntoResponse {
    let waid = normalize_user_id(&body.waid);
    if waid.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "missing waid"})),
        );
    }
    let reply = state
        .assistant
        .handle_action(&waid, body.text.as_deref(), body.action)
        .await;
    (StatusCode::OK, Json(serde_json::json!({"ok": true, "reply": reply})))
}
