//! Outbound delivery glue. Message transport and calendar OAuth live
//! outside the core; these are the deployment's stand-ins.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::warn;

use wayfare_core::{CalendarEvent, CalendarSync, Error, Notifier, Result};

/// Posts messages to a relay webhook (`NOTIFY_WEBHOOK_URL`). Without one
/// configured, messages are logged and dropped.
pub struct WebhookNotifier {
    http: Client,
    url: Option<String>,
}

impl WebhookNotifier {
    pub fn from_env() -> Self {
        Self {
            http: Client::new(),
            url: std::env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|u| !u.trim().is_empty()),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        let url = match self.url.as_deref() {
            Some(url) => url,
            None => {
                warn!("No outbound webhook configured; dropping message to {}", to);
                return Ok(());
            }
        };
        let response = self
            .http
            .post(url)
            .json(&json!({"to": to, "body": body}))
            .send()
            .await
            .map_err(|e| Error::Notify(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Error::Notify(format!("relay status {}", response.status())));
        }
        Ok(())
    }
}

/// Calendar capability stand-in: no calendar is linked in this deployment,
/// so every attempt reports "no calendar" and the caller moves on.
pub struct UnlinkedCalendar;

#[async_trait]
impl CalendarSync for UnlinkedCalendar {
    async fn add_event(&self, _owner: &str, _event: &CalendarEvent) -> Result<bool> {
        Ok(false)
    }
}
