//! HTTP route handlers — thin glue over the assistant.

pub mod actions;
pub mod documents;
pub mod status;
pub mod watch;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(documents::routes())
        .merge(actions::routes())
        .merge(watch::routes())
}

async fn health() -> &'static str {
    "ok"
}
