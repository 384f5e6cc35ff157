//! Wayfare — travel-document extraction and flight-watch server.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod notify;
mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("WAYFARE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = wayfare_core::WayfareConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = Arc::new(
        wayfare_store::TravelStore::open(&config.data_dir)
            .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?,
    );

    let extractor = Arc::new(wayfare_extract::CompletionClient::new(
        config.completion_api_key.clone(),
        config.completion_model.clone(),
    ));
    let status_source = Arc::new(wayfare_watch::AviationstackClient::new(
        config.provider_key.clone(),
    ));
    let notifier = Arc::new(notify::WebhookNotifier::from_env());
    let calendar = Arc::new(notify::UnlinkedCalendar);

    let assistant = wayfare_runtime::Assistant::new(
        config.clone(),
        store,
        extractor,
        calendar,
        notifier,
        status_source,
    );

    let state = Arc::new(AppState { config, assistant });
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Wayfare server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
