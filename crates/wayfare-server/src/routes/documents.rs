//! Document intake — the webhook-facing edge of the extraction pipeline.
//! Storage of the raw payload belongs to the external layer; these routes
//! only hand content to the indexer.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use wayfare_core::normalize_user_id;
use wayfare_extract::{IncomingDocument, IndexReport};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/documents", post(upload_document))
        .route("/documents/text", post(index_text))
}

/// POST /api/documents — multipart intake of one document.
///
/// Fields: `waid` (required), `source_id` (required), `title`, `tags`,
/// `image_ref`, and `file` carrying the payload.
async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut waid = None;
    let mut title = String::new();
    let mut tags = String::new();
    let mut source_id = None;
    let mut image_ref = None;
    let mut payload: Option<(Vec<u8>, String)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "waid" => waid = field.text().await.ok().map(|v| normalize_user_id(&v)),
            "title" => title = field.text().await.unwrap_or_default(),
            "tags" => tags = field.text().await.unwrap_or_default(),
            "source_id" => source_id = field.text().await.ok(),
            "image_ref" => image_ref = field.text().await.ok(),
            "file" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if let Ok(bytes) = field.bytes().await {
                    payload = Some((bytes.to_vec(), content_type));
                }
            }
            _ => {}
        }
    }

    let (waid, source_id, (bytes, content_type)) = match (waid, source_id, payload) {
        (Some(waid), Some(source_id), Some(payload)) if !waid.is_empty() => {
            (waid, source_id, payload)
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"ok": false, "error": "missing waid, source_id, or file"})),
            );
        }
    };

    let doc = IncomingDocument {
        bytes,
        content_type,
        title,
        tags,
        source_id,
        image_ref,
    };
    let report = state.assistant.ingest_document(&waid, &doc).await;
    (StatusCode::OK, Json(report_json(&report)))
}

#[derive(Deserialize)]
struct TextBody {
    waid: String,
    text: String,
    #[serde(default)]
    source_id: Option<String>,
}

/// POST /api/documents/text — index a pasted text message.
async fn index_text(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TextBody>,
) -> impl IntoResponse {
    let waid = normalize_user_id(&body.waid);
    if waid.is_empty() || body.text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"ok": false, "error": "missing waid or text"})),
        );
    }
    let report = state
        .assistant
        .ingest_text(&waid, &body.text, body.source_id.as_deref(), &body.text)
        .await;
    (StatusCode::OK, Json(report_json(&report)))
}

fn report_json(report: &IndexReport) -> serde_json::Value {
    serde_json::json!({
        "ok": true,
        "flights": report.flights,
        "hotels": report.hotels,
        "dropped": report.dropped,
        "calendar_attempts": report.calendar_attempts,
        "calendar_failures": report.calendar_failures,
    })
}
