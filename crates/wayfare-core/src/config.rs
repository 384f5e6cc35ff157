//! Runtime configuration, resolved once from the environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Service-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WayfareConfig {
    /// HTTP server port.
    pub port: u16,
    /// Directory holding the SQLite database.
    pub data_dir: PathBuf,
    /// Default origin airport when a destination is detected without one.
    pub home_airport: String,
    /// Local timezone for dual-rendering timestamps, if configured.
    pub local_tz: Option<Tz>,
    /// Broadcast list appended to every watch notification.
    pub broadcast: Vec<String>,
    /// Completion service API key (extraction disabled when absent).
    pub completion_api_key: Option<String>,
    /// Completion model name.
    pub completion_model: String,
    /// Flight-status provider access key.
    pub provider_key: Option<String>,
    /// Shared secret for the cron-style watch trigger.
    pub cron_secret: String,
    /// Maximum PDF pages to extract text from.
    pub pdf_page_cap: usize,
    /// Default lookahead window for upcoming-flight queries, in days.
    pub lookahead_days: i64,
    /// Contact name → user id aliases for "flights of <person>" queries.
    pub contact_aliases: HashMap<String, String>,
}

impl WayfareConfig {
    /// Build configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let local_tz = std::env::var("LOCAL_TZ")
            .ok()
            .and_then(|name| name.parse::<Tz>().ok());

        let broadcast = std::env::var("NOTIFY_CC")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();

        let contact_aliases = std::env::var("CONTACT_ALIASES")
            .map(|raw| parse_aliases(&raw))
            .unwrap_or_default();

        Ok(Self {
            port,
            data_dir,
            home_airport: env_or("HOME_AIRPORT", "TLV"),
            local_tz,
            broadcast,
            completion_api_key: non_empty(std::env::var("OPENAI_API_KEY").ok()),
            completion_model: env_or("OPENAI_MODEL", "gpt-4o-mini"),
            provider_key: non_empty(std::env::var("AVIATIONSTACK_KEY").ok()),
            cron_secret: env_or("CRON_SECRET", "changeme"),
            pdf_page_cap: std::env::var("PDF_PAGE_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(6),
            lookahead_days: std::env::var("LOOKAHEAD_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(90),
            contact_aliases,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Split a comma-separated list, dropping empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `name=id,name=id` alias pairs.
fn parse_aliases(raw: &str) -> HashMap<String, String> {
    let mut aliases = HashMap::new();
    for pair in raw.split(',') {
        if let Some((name, id)) = pair.split_once('=') {
            let name = name.trim();
            let id = id.trim();
            if !name.is_empty() && !id.is_empty() {
                aliases.insert(name.to_string(), id.to_string());
            }
        }
    }
    aliases
}
