//! The watch/diff pass: poll every subscription, hash the canonical
//! snapshot, and fan out notifications when it changed.
//!
//! Failures are isolated per subscription; one broken row never stops the
//! pass. One pass equals one external trigger invocation.

use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{error, info, warn};

use crate::message::format_status_message;
use crate::provider::{StatusFetch, StatusSource};
use crate::snapshot::CanonicalSnapshot;
use wayfare_core::{normalize_user_id, Error, Notifier, Result};
use wayfare_store::{TravelStore, WatchSubscription};

/// Aggregate outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchReport {
    /// Subscriptions considered.
    pub total: usize,
    /// Subscriptions whose snapshot changed (notified + persisted).
    pub updated: usize,
    /// Subscriptions that errored; the rest were unaffected.
    pub errors: usize,
}

/// Polls the watch registry and notifies on change.
pub struct WatchEngine {
    source: Arc<dyn StatusSource>,
    notifier: Arc<dyn Notifier>,
    broadcast: Vec<String>,
    local_tz: Option<Tz>,
}

impl WatchEngine {
    pub fn new(
        source: Arc<dyn StatusSource>,
        notifier: Arc<dyn Notifier>,
        broadcast: Vec<String>,
        local_tz: Option<Tz>,
    ) -> Self {
        Self {
            source,
            notifier,
            broadcast,
            local_tz,
        }
    }

    /// Run one pass over every subscription, in registry order.
    pub async fn run_pass(&self, store: &TravelStore) -> WatchReport {
        let subs = match store.all_watches() {
            Ok(subs) => subs,
            Err(e) => {
                error!("Could not read watch registry: {}", e);
                return WatchReport::default();
            }
        };

        let mut report = WatchReport {
            total: subs.len(),
            ..Default::default()
        };
        for sub in subs {
            match self.poll_one(store, &sub).await {
                Ok(true) => report.updated += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Watch {} ({}) errored: {}", sub.id, sub.flight_code, e);
                    report.errors += 1;
                }
            }
        }

        info!(
            "Watch pass complete: {} total, {} updated, {} errors",
            report.total, report.updated, report.errors
        );
        report
    }

    /// Poll one subscription. `Ok(true)` means a change was persisted and
    /// notified; `Ok(false)` means nothing to do this pass.
    async fn poll_one(&self, store: &TravelStore, sub: &WatchSubscription) -> Result<bool> {
        let data = match self
            .source
            .fetch(&sub.flight_code, sub.flight_date.as_deref())
            .await
        {
            StatusFetch::Data(data) => data,
            StatusFetch::Failed(reason) => return Err(Error::Provider(reason)),
        };

        // Empty data is a normal transient condition, not an error
        let first = match data.first() {
            Some(first) => first,
            None => return Ok(false),
        };

        let snapshot = CanonicalSnapshot::from_provider(first);
        let hash = snapshot.hash();

        // Re-read the stored hash so a concurrent pass can't double-notify
        let previous = store.watch_hash(sub.id)?;
        if previous.as_deref() == Some(hash.as_str()) {
            return Ok(false);
        }

        let snapshot_json = serde_json::to_string(&snapshot)?;
        store.update_watch_snapshot(sub.id, &snapshot_json, &hash)?;

        let body = format_status_message(&snapshot, self.local_tz);
        self.fan_out(&sub.waid, &body).await;
        Ok(true)
    }

    /// Send to the owner plus every broadcast address. Delivery failures
    /// are logged, never retried here.
    async fn fan_out(&self, owner: &str, body: &str) {
        let recipients =
            std::iter::once(owner.to_string()).chain(self.broadcast.iter().map(|r| normalize_user_id(r)));
        for recipient in recipients {
            if let Err(e) = self.notifier.send(&recipient, body).await {
                warn!("Notification to {} failed: {}", recipient, e);
            }
        }
    }
}
