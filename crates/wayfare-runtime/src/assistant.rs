//! The assistant facade: one object owning the extraction pipeline, the
//! watch engine, and the typed-action executor.

use std::sync::Arc;

use tracing::{error, info};

use crate::actions::{Action, DetailScope};
use crate::session::Session;
use wayfare_core::{CalendarSync, Notifier, WayfareConfig};
use wayfare_extract::{BookingIndexer, IncomingDocument, IndexReport, StructuredExtractor};
use wayfare_store::{FlightRecord, StoreCounts, TravelStore};
use wayfare_watch::{
    format_status_message, CanonicalSnapshot, StatusFetch, StatusSource, WatchEngine, WatchReport,
};

/// Top-level entry point for both subsystems. Triggered synchronously: the
/// intake path by a webhook-style call, the watch pass by an external
/// timer.
pub struct Assistant {
    config: WayfareConfig,
    store: Arc<TravelStore>,
    indexer: BookingIndexer,
    engine: WatchEngine,
    status_source: Arc<dyn StatusSource>,
}

impl Assistant {
    pub fn new(
        config: WayfareConfig,
        store: Arc<TravelStore>,
        extractor: Arc<dyn StructuredExtractor>,
        calendar: Arc<dyn CalendarSync>,
        notifier: Arc<dyn Notifier>,
        status_source: Arc<dyn StatusSource>,
    ) -> Self {
        let indexer = BookingIndexer::new(
            store.clone(),
            extractor,
            calendar,
            config.home_airport.clone(),
            config.pdf_page_cap,
        );
        let engine = WatchEngine::new(
            status_source.clone(),
            notifier,
            config.broadcast.clone(),
            config.local_tz,
        );
        info!(
            "Assistant initialized: home={}, broadcast={} addresses",
            config.home_airport,
            config.broadcast.len()
        );
        Self {
            config,
            store,
            indexer,
            engine,
            status_source,
        }
    }

    pub fn store(&self) -> &Arc<TravelStore> {
        &self.store
    }

    /// Index an inbound document (text, PDF, or image).
    pub async fn ingest_document(&self, waid: &str, doc: &IncomingDocument) -> IndexReport {
        self.indexer.index_document(waid, doc).await
    }

    /// Index free text, e.g. a pasted confirmation message.
    pub async fn ingest_text(
        &self,
        waid: &str,
        text: &str,
        source_doc_id: Option<&str>,
        raw_excerpt: &str,
    ) -> IndexReport {
        self.indexer.index_text(waid, text, source_doc_id, raw_excerpt).await
    }

    /// One watch/diff pass over every subscription.
    pub async fn run_watch_pass(&self) -> WatchReport {
        self.engine.run_pass(&self.store).await
    }

    /// Record counts for the status endpoint.
    pub fn counts(&self) -> StoreCounts {
        self.store.counts().unwrap_or_else(|e| {
            error!("Count query failed: {}", e);
            StoreCounts { flights: 0, hotels: 0, watches: 0 }
        })
    }

    /// Execute a typed action and return the reply text. The exchange is
    /// recorded into the user's session (load at start, save at end).
    pub async fn handle_action(&self, waid: &str, user_text: Option<&str>, action: Action) -> String {
        let mut session = Session::load(&self.store, waid);
        let reply = self.execute(waid, action).await;
        if let Some(user_text) = user_text {
            session.record(user_text, &reply);
            session.save(&self.store);
        }
        reply
    }

    async fn execute(&self, waid: &str, action: Action) -> String {
        match action {
            Action::ListUserFlights { range_days } => {
                let days = range_days.unwrap_or(self.config.lookahead_days);
                self.list_flights_reply(waid, days, "✈️ Your upcoming flights:")
            }
            Action::ListContactFlights { contact, range_days } => {
                let other = match self.config.contact_aliases.get(&contact) {
                    Some(other) => wayfare_core::normalize_user_id(other),
                    None => {
                        return format!(
                            "I don't know '{}'. Add them to the contact aliases first.",
                            contact
                        )
                    }
                };
                let days = range_days.unwrap_or(self.config.lookahead_days);
                self.list_flights_reply(&other, days, &format!("✈️ {}'s flights:", contact))
            }
            Action::SubscribeFlight { code, date } => {
                let code = code.trim().to_uppercase();
                if code.is_empty() {
                    return "I couldn't read the flight code. Try e.g. LY81 2025-09-08.".into();
                }
                match self.store.add_watch(waid, &code, date.as_deref()) {
                    Ok(_) => {
                        let when = date.map(|d| format!(" ({})", d)).unwrap_or_default();
                        format!(
                            "Tracking {}{}. I'll message you when something changes.",
                            code, when
                        )
                    }
                    Err(e) => {
                        error!("Subscribe failed for {}: {}", code, e);
                        "Something went wrong saving that subscription.".into()
                    }
                }
            }
            Action::CancelFlight { code } => {
                let code = code
                    .map(|c| c.trim().to_uppercase())
                    .filter(|c| !c.is_empty());
                match self.store.remove_watches(waid, code.as_deref()) {
                    Ok(n) => match code {
                        Some(code) => format!("Stopped tracking {} ({} rows removed).", code, n),
                        None => format!("Stopped tracking all flights ({} rows removed).", n),
                    },
                    Err(e) => {
                        error!("Cancel failed: {}", e);
                        "Something went wrong cancelling that subscription.".into()
                    }
                }
            }
            Action::FlightStatus { code } => {
                let code = code.trim().to_uppercase();
                // Provider-down and not-found read the same to the user
                match self.status_source.fetch(&code, None).await {
                    StatusFetch::Data(data) if !data.is_empty() => {
                        let snapshot = CanonicalSnapshot::from_provider(&data[0]);
                        format_status_message(&snapshot, self.config.local_tz)
                    }
                    _ => "No status found for that flight right now.".into(),
                }
            }
            Action::FlightDetails { scope } => {
                let rows = self
                    .store
                    .upcoming_flights(waid, None, 5)
                    .unwrap_or_default();
                let picked: Vec<&FlightRecord> = match scope {
                    DetailScope::Latest => rows.first().into_iter().collect(),
                    DetailScope::Return if rows.len() > 1 => rows.last().into_iter().collect(),
                    DetailScope::Return => rows.first().into_iter().collect(),
                    DetailScope::All => rows.iter().take(2).collect(),
                };
                if picked.is_empty() {
                    return "No upcoming flights found. Send a ticket PDF/image or the details as text."
                        .into();
                }
                picked
                    .iter()
                    .map(|r| flight_details(r))
                    .collect::<Vec<_>>()
                    .join("\n\n")
            }
            Action::ListWatches => {
                let rows = self.store.list_watches(waid).unwrap_or_default();
                if rows.is_empty() {
                    return "No active subscriptions right now.".into();
                }
                let mut lines = vec![format!("✈️ Tracked flights ({}):", rows.len())];
                for sub in rows {
                    let date = sub
                        .flight_date
                        .map(|d| format!(" {}", d))
                        .unwrap_or_default();
                    lines.push(format!(
                        "#{} {}{} (since {})",
                        sub.id, sub.flight_code, date, sub.created_at
                    ));
                }
                lines.join("\n")
            }
        }
    }

    fn list_flights_reply(&self, waid: &str, days: i64, header: &str) -> String {
        let rows = self
            .store
            .upcoming_flights(waid, Some(days), 3)
            .unwrap_or_default();
        if rows.is_empty() {
            return "No upcoming flights found.".into();
        }
        let mut lines = vec![header.to_string()];
        lines.extend(rows.iter().map(flight_line));
        lines.join("\n")
    }
}

/// One listing line: `- 2025-09-08 14:30 TLV→BKK LY081 | El Al`.
fn flight_line(record: &FlightRecord) -> String {
    let mut line = format!(
        "- {} {} {}→{} {}",
        record.depart_date,
        record.depart_time.as_deref().unwrap_or(""),
        record.origin.as_deref().unwrap_or(""),
        record.dest,
        record.flight_number.as_deref().unwrap_or(""),
    );
    if let Some(airline) = record.airline.as_deref() {
        line.push_str(&format!(" | {}", airline));
    }
    collapse_spaces(line.trim_end())
}

fn flight_details(record: &FlightRecord) -> String {
    [
        "✈️ Flight details:".to_string(),
        format!(
            "- Date/time: {} {}",
            record.depart_date,
            record.depart_time.as_deref().unwrap_or("")
        )
        .trim_end()
        .to_string(),
        format!(
            "- Route: {} → {}",
            record.origin.as_deref().unwrap_or(""),
            record.dest
        ),
        format!("- Airline: {}", record.airline.as_deref().unwrap_or("-")),
        format!(
            "- Flight number: {}",
            record.flight_number.as_deref().unwrap_or("-")
        ),
        format!("- PNR: {}", record.pnr.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = false;
    for c in s.chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out
}
