//! End-to-end pipeline tests: document text → persisted records → calendar
//! sync, and subscribe → poll → notify → cancel, with every external
//! collaborator stubbed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};

use wayfare_core::{CalendarEvent, CalendarSync, Notifier, Result, WayfareConfig};
use wayfare_extract::{
    BookingCandidates, EmptyReason, ExtractOutcome, FlightCandidate, StructuredExtractor,
};
use wayfare_runtime::{Action, Assistant, DetailScope};
use wayfare_store::{NewFlight, TravelStore};
use wayfare_watch::{StatusFetch, StatusSource};

struct StubExtractor {
    outcome: ExtractOutcome,
}

#[async_trait]
impl StructuredExtractor for StubExtractor {
    async fn extract_text(&self, _text: &str) -> ExtractOutcome {
        self.outcome.clone()
    }
    async fn extract_image(&self, _image_url: &str, _hint: &str) -> ExtractOutcome {
        self.outcome.clone()
    }
}

#[derive(Default)]
struct RecordingCalendar {
    events: Mutex<Vec<(String, CalendarEvent)>>,
}

#[async_trait]
impl CalendarSync for RecordingCalendar {
    async fn add_event(&self, owner: &str, event: &CalendarEvent) -> Result<bool> {
        self.events.lock().push((owner.to_string(), event.clone()));
        Ok(true)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        self.sent.lock().push((to.to_string(), body.to_string()));
        Ok(())
    }
}

/// Returns canned responses in sequence; the last one repeats.
struct SequencedSource {
    responses: Vec<StatusFetch>,
    cursor: Mutex<usize>,
}

impl SequencedSource {
    fn new(responses: Vec<StatusFetch>) -> Self {
        Self { responses, cursor: Mutex::new(0) }
    }
}

#[async_trait]
impl StatusSource for SequencedSource {
    async fn fetch(&self, _flight_code: &str, _flight_date: Option<&str>) -> StatusFetch {
        let mut cursor = self.cursor.lock();
        let idx = (*cursor).min(self.responses.len() - 1);
        *cursor += 1;
        self.responses[idx].clone()
    }
}

fn test_config(data_dir: &std::path::Path) -> WayfareConfig {
    WayfareConfig {
        port: 0,
        data_dir: data_dir.to_path_buf(),
        home_airport: "TLV".into(),
        local_tz: None,
        broadcast: vec!["whatsapp:+97250001".into()],
        completion_api_key: None,
        completion_model: "gpt-4o-mini".into(),
        provider_key: None,
        cron_secret: "changeme".into(),
        pdf_page_cap: 6,
        lookahead_days: 90,
        contact_aliases: [("dolev".to_string(), "whatsapp:+97250009".to_string())]
            .into_iter()
            .collect(),
    }
}

struct Harness {
    assistant: Assistant,
    store: Arc<TravelStore>,
    calendar: Arc<RecordingCalendar>,
    notifier: Arc<RecordingNotifier>,
    _dir: tempfile::TempDir,
}

fn harness(outcome: ExtractOutcome, responses: Vec<StatusFetch>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(TravelStore::open(dir.path()).unwrap());
    let calendar = Arc::new(RecordingCalendar::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let assistant = Assistant::new(
        test_config(dir.path()),
        store.clone(),
        Arc::new(StubExtractor { outcome }),
        calendar.clone(),
        notifier.clone(),
        Arc::new(SequencedSource::new(responses)),
    );
    Harness { assistant, store, calendar, notifier, _dir: dir }
}

fn provider_record(gate: &str) -> Value {
    json!({
        "flight_status": "scheduled",
        "airline": {"name": "El Al"},
        "flight": {"iata": "LY081", "number": "81"},
        "departure": {"airport": "Ben Gurion", "gate": gate,
                       "scheduled": "2025-09-08T14:30:00+00:00"},
        "arrival": {"airport": "Suvarnabhumi"},
    })
}

#[tokio::test]
async fn test_booking_text_end_to_end() {
    // The extractor reads the PDF text and returns one structured flight
    let outcome = ExtractOutcome::Extracted(BookingCandidates {
        flights: vec![FlightCandidate {
            origin: Some("TLV".into()),
            dest: Some("BKK".into()),
            depart_date: Some("2025-09-08".into()),
            depart_time: Some("14:30".into()),
            airline: Some("El Al".into()),
            flight_number: Some("LY081".into()),
            pnr: Some("ABC123".into()),
            ..Default::default()
        }],
        hotels: vec![],
    });
    let h = harness(outcome, vec![]);

    let text = "LY081 TLV-BKK 2025-09-08 14:30, PNR ABC123";
    let report = h
        .assistant
        .ingest_text("111", text, Some("doc-1"), text)
        .await;

    assert_eq!(report.flights.len(), 1);
    let record = &report.flights[0];
    assert_eq!(record.flight_number.as_deref(), Some("LY081"));
    assert_eq!(record.origin.as_deref(), Some("TLV"));
    assert_eq!(record.dest, "BKK");
    assert_eq!(record.depart_date, "2025-09-08");
    assert_eq!(record.depart_time.as_deref(), Some("14:30"));
    assert_eq!(record.pnr.as_deref(), Some("ABC123"));
    assert_eq!(record.source_doc_id.as_deref(), Some("doc-1"));

    // Exactly one best-effort calendar attempt, summary carries the route
    let events = h.calendar.events.lock();
    assert_eq!(events.len(), 1);
    assert!(events[0].1.summary.contains("TLV→BKK"));
}

#[tokio::test]
async fn test_heuristic_fallback_end_to_end() {
    let h = harness(ExtractOutcome::Empty(EmptyReason::Transport("timeout".into())), vec![]);

    let report = h
        .assistant
        .ingest_text("111", "Flight to BKK on 2025-09-08", None, "excerpt")
        .await;

    assert_eq!(report.flights.len(), 1);
    assert_eq!(report.flights[0].dest, "BKK");
    assert_eq!(report.flights[0].origin.as_deref(), Some("TLV"));
    assert_eq!(
        report.extract_reason,
        Some(EmptyReason::Transport("timeout".into()))
    );
}

#[tokio::test]
async fn test_subscribe_poll_notify_cancel() {
    let responses = vec![
        StatusFetch::Data(vec![provider_record("B4")]),
        StatusFetch::Data(vec![provider_record("B4")]),
        StatusFetch::Data(vec![provider_record("C2")]),
    ];
    let h = harness(ExtractOutcome::Empty(EmptyReason::NotConfigured), responses);

    // Subscribe (code is normalized to upper case)
    let reply = h
        .assistant
        .handle_action(
            "111",
            Some("track flight ly081 2025-09-08"),
            Action::SubscribeFlight { code: "ly081".into(), date: Some("2025-09-08".into()) },
        )
        .await;
    assert!(reply.contains("LY081"));
    assert_eq!(h.store.list_watches("111").unwrap().len(), 1);

    // First poll: change (null hash), owner + one broadcast address
    let report = h.assistant.run_watch_pass().await;
    assert_eq!((report.total, report.updated, report.errors), (1, 1, 0));
    assert_eq!(h.notifier.sent.lock().len(), 2);
    assert_eq!(h.notifier.sent.lock()[0].0, "111");
    assert_eq!(h.notifier.sent.lock()[1].0, "97250001");

    // Second poll: identical snapshot, nothing happens
    let report = h.assistant.run_watch_pass().await;
    assert_eq!((report.updated, report.errors), (0, 0));
    assert_eq!(h.notifier.sent.lock().len(), 2);

    // Third poll: gate changed, one more fan-out
    let report = h.assistant.run_watch_pass().await;
    assert_eq!(report.updated, 1);
    assert_eq!(h.notifier.sent.lock().len(), 4);

    // Cancel with the code removes only matching rows and reports the count
    let reply = h
        .assistant
        .handle_action("111", None, Action::CancelFlight { code: Some("LY081".into()) })
        .await;
    assert!(reply.contains("1 rows removed"));
    assert!(h.store.list_watches("111").unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_all_scope() {
    let h = harness(ExtractOutcome::Empty(EmptyReason::NotConfigured), vec![]);
    h.store.add_watch("111", "LY81", None).unwrap();
    h.store.add_watch("111", "BA123", None).unwrap();
    h.store.add_watch("222", "LY81", None).unwrap();

    let reply = h
        .assistant
        .handle_action("111", None, Action::CancelFlight { code: None })
        .await;
    assert!(reply.contains("2 rows removed"));
    // The other owner's subscription is untouched
    assert_eq!(h.store.list_watches("222").unwrap().len(), 1);
}

#[tokio::test]
async fn test_status_query_collapses_failures() {
    let h = harness(
        ExtractOutcome::Empty(EmptyReason::NotConfigured),
        vec![StatusFetch::Failed("provider HTTP 500".into())],
    );
    let reply = h
        .assistant
        .handle_action("111", None, Action::FlightStatus { code: "LY81".into() })
        .await;
    assert_eq!(reply, "No status found for that flight right now.");
}

#[tokio::test]
async fn test_status_query_formats_snapshot() {
    let h = harness(
        ExtractOutcome::Empty(EmptyReason::NotConfigured),
        vec![StatusFetch::Data(vec![provider_record("B4")])],
    );
    let reply = h
        .assistant
        .handle_action("111", None, Action::FlightStatus { code: "ly081".into() })
        .await;
    assert!(reply.starts_with("✈️ Flight update LY081"));
    assert!(reply.contains("gate B4"));
}

#[tokio::test]
async fn test_listing_and_details_actions() {
    let h = harness(ExtractOutcome::Empty(EmptyReason::NotConfigured), vec![]);

    let soon = (Utc::now() + Duration::days(5)).format("%Y-%m-%d").to_string();
    let later = (Utc::now() + Duration::days(12)).format("%Y-%m-%d").to_string();
    h.store
        .insert_flight(NewFlight {
            waid: "111".into(),
            origin: Some("TLV".into()),
            dest: "BKK".into(),
            depart_date: soon.clone(),
            depart_time: Some("14:30".into()),
            airline: Some("El Al".into()),
            flight_number: Some("LY081".into()),
            pnr: Some("ABC123".into()),
            ..Default::default()
        })
        .unwrap();
    h.store
        .insert_flight(NewFlight {
            waid: "111".into(),
            origin: Some("BKK".into()),
            dest: "TLV".into(),
            depart_date: later.clone(),
            ..Default::default()
        })
        .unwrap();

    let reply = h
        .assistant
        .handle_action("111", Some("what are my flights?"), Action::ListUserFlights { range_days: None })
        .await;
    assert!(reply.starts_with("✈️ Your upcoming flights:"));
    assert!(reply.contains(&format!("{} 14:30 TLV→BKK LY081 | El Al", soon)));

    // The exchange was recorded in the session store
    let turns = h.store.load_session("111").unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "what are my flights?");

    // Return scope picks the last upcoming leg
    let reply = h
        .assistant
        .handle_action("111", None, Action::FlightDetails { scope: DetailScope::Return })
        .await;
    assert!(reply.contains("BKK → TLV"));
    assert!(reply.contains(&later));

    // Latest scope picks the next one, with PNR
    let reply = h
        .assistant
        .handle_action("111", None, Action::FlightDetails { scope: DetailScope::Latest })
        .await;
    assert!(reply.contains("TLV → BKK"));
    assert!(reply.contains("- PNR: ABC123"));
}

#[tokio::test]
async fn test_contact_alias_listing() {
    let h = harness(ExtractOutcome::Empty(EmptyReason::NotConfigured), vec![]);
    let soon = (Utc::now() + Duration::days(3)).format("%Y-%m-%d").to_string();
    // The alias target is stored under its normalized id
    h.store
        .insert_flight(NewFlight {
            waid: "97250009".into(),
            origin: Some("TLV".into()),
            dest: "HKT".into(),
            depart_date: soon,
            ..Default::default()
        })
        .unwrap();

    let reply = h
        .assistant
        .handle_action(
            "111",
            None,
            Action::ListContactFlights { contact: "dolev".into(), range_days: Some(7) },
        )
        .await;
    assert!(reply.contains("dolev's flights"));
    assert!(reply.contains("TLV→HKT"));

    let reply = h
        .assistant
        .handle_action(
            "111",
            None,
            Action::ListContactFlights { contact: "stranger".into(), range_days: None },
        )
        .await;
    assert!(reply.contains("I don't know 'stranger'"));
}

#[tokio::test]
async fn test_list_watches_action() {
    let h = harness(ExtractOutcome::Empty(EmptyReason::NotConfigured), vec![]);
    let reply = h.assistant.handle_action("111", None, Action::ListWatches).await;
    assert_eq!(reply, "No active subscriptions right now.");

    h.store.add_watch("111", "LY81", Some("2025-09-08")).unwrap();
    let reply = h.assistant.handle_action("111", None, Action::ListWatches).await;
    assert!(reply.contains("Tracked flights (1):"));
    assert!(reply.contains("LY81 2025-09-08"));
}
