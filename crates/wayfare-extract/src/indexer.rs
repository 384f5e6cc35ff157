//! Booking Indexer — merges heuristic and AI extraction, persists the
//! survivors, and fires best-effort calendar sync.
//!
//! The AI result always wins; the heuristic candidate is promoted only when
//! the AI pass yields zero flights. Candidates missing required fields are
//! dropped, never partial-persisted. Nothing in here raises: every failure
//! is logged and folded into the report.

use std::sync::Arc;

use chrono::NaiveTime;
use tracing::{debug, error, warn};

use crate::candidates::{FlightCandidate, HotelCandidate};
use crate::completion::{EmptyReason, StructuredExtractor};
use crate::heuristic::heuristic_candidate;
use wayfare_core::{CalendarEvent, CalendarSync, EventWindow};
use wayfare_store::{FlightRecord, HotelRecord, NewFlight, NewHotel, TravelStore};

/// Audit excerpts are bounded to this many characters.
pub const EXCERPT_CAP: usize = 2000;

/// What one extraction pass did.
#[derive(Debug, Default)]
pub struct IndexReport {
    /// Flight records persisted this pass.
    pub flights: Vec<FlightRecord>,
    /// Hotel records persisted this pass.
    pub hotels: Vec<HotelRecord>,
    /// Candidates dropped by the minimum-field gate.
    pub dropped: usize,
    /// Calendar syncs attempted (one per persisted record).
    pub calendar_attempts: usize,
    /// Calendar syncs that failed; never escalated.
    pub calendar_failures: usize,
    /// Persistence failures; the pass continues past them.
    pub store_errors: usize,
    /// Why the AI extractor returned nothing, when it did.
    pub extract_reason: Option<EmptyReason>,
}

/// Orchestrates extraction and persistence for one document at a time.
pub struct BookingIndexer {
    store: Arc<TravelStore>,
    extractor: Arc<dyn StructuredExtractor>,
    calendar: Arc<dyn CalendarSync>,
    home_airport: String,
    pdf_page_cap: usize,
}

impl BookingIndexer {
    pub fn new(
        store: Arc<TravelStore>,
        extractor: Arc<dyn StructuredExtractor>,
        calendar: Arc<dyn CalendarSync>,
        home_airport: impl Into<String>,
        pdf_page_cap: usize,
    ) -> Self {
        Self {
            store,
            extractor,
            calendar,
            home_airport: home_airport.into(),
            pdf_page_cap,
        }
    }

    pub(crate) fn pdf_page_cap(&self) -> usize {
        self.pdf_page_cap
    }

    pub(crate) fn extractor(&self) -> &Arc<dyn StructuredExtractor> {
        &self.extractor
    }

    /// Index free text for one owner: extract, merge, persist, sync.
    pub async fn index_text(
        &self,
        waid: &str,
        text: &str,
        source_doc_id: Option<&str>,
        raw_excerpt: &str,
    ) -> IndexReport {
        let mut report = IndexReport::default();

        let naive = heuristic_candidate(text, &self.home_airport);

        let (candidates, reason) = self.extractor.extract_text(text).await.into_parts();
        report.extract_reason = reason;

        let mut flights = candidates.flights;
        if flights.is_empty() {
            if let Some(naive) = naive {
                if naive.is_storable() {
                    debug!("AI yielded no flights; promoting heuristic candidate");
                    flights.push(naive);
                }
            }
        }

        let excerpt = truncate_chars(raw_excerpt, EXCERPT_CAP);
        for candidate in flights {
            self.persist_flight(waid, candidate, source_doc_id, excerpt, &mut report)
                .await;
        }
        for candidate in candidates.hotels {
            self.persist_hotel(waid, candidate, source_doc_id, excerpt, &mut report)
                .await;
        }

        report
    }

    async fn persist_flight(
        &self,
        waid: &str,
        candidate: FlightCandidate,
        source_doc_id: Option<&str>,
        excerpt: &str,
        report: &mut IndexReport,
    ) {
        if !candidate.is_storable() {
            report.dropped += 1;
            return;
        }
        let new = NewFlight {
            waid: waid.to_string(),
            origin: candidate.origin,
            dest: candidate.dest.unwrap_or_default(),
            depart_date: candidate.depart_date.unwrap_or_default(),
            depart_time: candidate.depart_time,
            arrival_date: candidate.arrival_date,
            arrival_time: candidate.arrival_time,
            airline: candidate.airline,
            flight_number: candidate.flight_number,
            pnr: candidate.pnr,
            passengers: candidate.passengers,
            source_doc_id: source_doc_id.map(String::from),
            raw_excerpt: Some(excerpt.to_string()),
        };
        let record = match self.store.insert_flight(new) {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to persist flight record: {}", e);
                report.store_errors += 1;
                return;
            }
        };

        let event = flight_event(&record);
        self.try_calendar(waid, &event, report).await;
        report.flights.push(record);
    }

    async fn persist_hotel(
        &self,
        waid: &str,
        candidate: HotelCandidate,
        source_doc_id: Option<&str>,
        excerpt: &str,
        report: &mut IndexReport,
    ) {
        if !candidate.is_storable() {
            report.dropped += 1;
            return;
        }
        let new = NewHotel {
            waid: waid.to_string(),
            hotel_name: candidate.hotel_name,
            city: candidate.city,
            checkin_date: candidate.checkin_date.unwrap_or_default(),
            checkout_date: candidate.checkout_date,
            address: candidate.address,
            source_doc_id: source_doc_id.map(String::from),
            raw_excerpt: Some(excerpt.to_string()),
        };
        let record = match self.store.insert_hotel(new) {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to persist hotel record: {}", e);
                report.store_errors += 1;
                return;
            }
        };

        let event = hotel_event(&record);
        self.try_calendar(waid, &event, report).await;
        report.hotels.push(record);
    }

    /// One calendar attempt per record; failure never blocks the next.
    async fn try_calendar(&self, waid: &str, event: &CalendarEvent, report: &mut IndexReport) {
        report.calendar_attempts += 1;
        match self.calendar.add_event(waid, event).await {
            Ok(true) => {}
            Ok(false) => debug!("No linked calendar for {}", waid),
            Err(e) => {
                warn!("Calendar sync failed for {}: {}", waid, e);
                report.calendar_failures += 1;
            }
        }
    }
}

/// Timed departure event for a flight record.
fn flight_event(record: &FlightRecord) -> CalendarEvent {
    let summary = format!(
        "✈️ {}→{} {}",
        record.origin.as_deref().unwrap_or(""),
        record.dest,
        record.flight_number.as_deref().unwrap_or(""),
    )
    .trim()
    .to_string();
    let description = format!(
        "Airline: {}\nPNR: {}",
        record.airline.as_deref().unwrap_or(""),
        record.pnr.as_deref().unwrap_or(""),
    );
    CalendarEvent {
        summary,
        description,
        window: EventWindow::Timed {
            start: event_start(&record.depart_date, record.depart_time.as_deref()),
            end: None,
        },
    }
}

/// All-day stay event; check-out defaults to check-in.
fn hotel_event(record: &HotelRecord) -> CalendarEvent {
    CalendarEvent {
        summary: format!("🏨 Check-in: {}", record.hotel_name.as_deref().unwrap_or("")),
        description: format!(
            "City: {}\nAddress: {}",
            record.city.as_deref().unwrap_or(""),
            record.address.as_deref().unwrap_or(""),
        ),
        window: EventWindow::AllDay {
            start: record.checkin_date.clone(),
            end: record
                .checkout_date
                .clone()
                .unwrap_or_else(|| record.checkin_date.clone()),
        },
    }
}

/// `YYYY-MM-DDTHH:MM:00`, defaulting to 09:00 when the time is absent or
/// not a valid `HH:MM`.
fn event_start(date: &str, time: Option<&str>) -> String {
    match time.filter(|t| NaiveTime::parse_from_str(t, "%H:%M").is_ok()) {
        Some(t) => format!("{}T{}:00", date, t),
        None => format!("{}T09:00:00", date),
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::candidates::BookingCandidates;
    use crate::completion::ExtractOutcome;
    use wayfare_core::{Error, Result};

    /// Extractor that always returns a preset outcome.
    pub(crate) struct StubExtractor {
        pub outcome: ExtractOutcome,
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

    /// Calendar double that records events, optionally failing every call.
    #[derive(Default)]
    pub(crate) struct RecordingCalendar {
        pub events: Mutex<Vec<(String, CalendarEvent)>>,
        pub fail: bool,
    }

    #[async_trait]
    impl CalendarSync for RecordingCalendar {
        async fn add_event(&self, owner: &str, event: &CalendarEvent) -> Result<bool> {
            if self.fail {
                return Err(Error::Calendar("credentials expired".into()));
            }
            self.events.lock().push((owner.to_string(), event.clone()));
            Ok(true)
        }
    }

    fn indexer_with(
        outcome: ExtractOutcome,
        calendar: Arc<RecordingCalendar>,
    ) -> (BookingIndexer, Arc<TravelStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TravelStore::open(dir.path()).unwrap());
        let indexer = BookingIndexer::new(
            store.clone(),
            Arc::new(StubExtractor { outcome }),
            calendar,
            "TLV",
            6,
        );
        (indexer, store, dir)
    }

    fn ai_flight(dest: &str, date: &str) -> FlightCandidate {
        FlightCandidate {
            dest: Some(dest.into()),
            depart_date: Some(date.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_heuristic_promoted_when_ai_unavailable() {
        let calendar = Arc::new(RecordingCalendar::default());
        let (indexer, _store, _dir) = indexer_with(
            ExtractOutcome::Empty(EmptyReason::NotConfigured),
            calendar.clone(),
        );

        let report = indexer
            .index_text("111", "Flight to BKK on 2025-09-08", None, "excerpt")
            .await;

        assert_eq!(report.flights.len(), 1);
        let record = &report.flights[0];
        assert_eq!(record.dest, "BKK");
        assert_eq!(record.depart_date, "2025-09-08");
        assert_eq!(record.origin.as_deref(), Some("TLV"));
        assert_eq!(report.extract_reason, Some(EmptyReason::NotConfigured));
    }

    #[tokio::test]
    async fn test_ai_result_wins_over_heuristic() {
        let calendar = Arc::new(RecordingCalendar::default());
        let outcome = ExtractOutcome::Extracted(BookingCandidates {
            flights: vec![ai_flight("HKT", "2025-09-10")],
            hotels: vec![],
        });
        let (indexer, _store, _dir) = indexer_with(outcome, calendar);

        // Text would heuristically yield TLV→BKK on 2025-09-08
        let report = indexer
            .index_text("111", "TLV BKK on 2025-09-08", None, "excerpt")
            .await;

        assert_eq!(report.flights.len(), 1);
        assert_eq!(report.flights[0].dest, "HKT");
        assert_eq!(report.flights[0].depart_date, "2025-09-10");
    }

    #[tokio::test]
    async fn test_minimum_field_gate_drops_partial() {
        let calendar = Arc::new(RecordingCalendar::default());
        let outcome = ExtractOutcome::Extracted(BookingCandidates {
            flights: vec![FlightCandidate {
                dest: Some("BKK".into()),
                airline: Some("El Al".into()),
                flight_number: Some("LY081".into()),
                pnr: Some("ABC123".into()),
                ..Default::default()
            }],
            hotels: vec![HotelCandidate {
                hotel_name: Some("Siam Inn".into()),
                ..Default::default()
            }],
        });
        let (indexer, store, _dir) = indexer_with(outcome, calendar);

        let report = indexer.index_text("111", "irrelevant", None, "e").await;

        assert!(report.flights.is_empty());
        assert!(report.hotels.is_empty());
        assert_eq!(report.dropped, 2);
        assert_eq!(store.counts().unwrap().flights, 0);
    }

    #[tokio::test]
    async fn test_calendar_failure_does_not_block_persistence() {
        let calendar = Arc::new(RecordingCalendar {
            fail: true,
            ..Default::default()
        });
        let outcome = ExtractOutcome::Extracted(BookingCandidates {
            flights: vec![ai_flight("BKK", "2025-09-08"), ai_flight("HKT", "2025-09-12")],
            hotels: vec![],
        });
        let (indexer, store, _dir) = indexer_with(outcome, calendar);

        let report = indexer.index_text("111", "irrelevant", None, "e").await;

        assert_eq!(report.flights.len(), 2);
        assert_eq!(report.calendar_attempts, 2);
        assert_eq!(report.calendar_failures, 2);
        assert_eq!(store.counts().unwrap().flights, 2);
    }

    #[tokio::test]
    async fn test_hotel_checkout_defaults_to_checkin() {
        let calendar = Arc::new(RecordingCalendar::default());
        let outcome = ExtractOutcome::Extracted(BookingCandidates {
            flights: vec![],
            hotels: vec![HotelCandidate {
                hotel_name: Some("Siam Inn".into()),
                checkin_date: Some("2025-09-09".into()),
                ..Default::default()
            }],
        });
        let (indexer, _store, _dir) = indexer_with(outcome, calendar.clone());

        // AI yielded no flights and the text has no destination either, so
        // only the hotel lands.
        let report = indexer.index_text("111", "hotel only", None, "e").await;
        assert!(report.flights.is_empty());
        assert_eq!(report.hotels.len(), 1);

        let events = calendar.events.lock();
        assert_eq!(events.len(), 1);
        match &events[0].1.window {
            EventWindow::AllDay { start, end } => {
                assert_eq!(start, "2025-09-09");
                assert_eq!(end, "2025-09-09");
            }
            other => panic!("expected all-day window, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_excerpt_bounded() {
        let calendar = Arc::new(RecordingCalendar::default());
        let outcome = ExtractOutcome::Extracted(BookingCandidates {
            flights: vec![ai_flight("BKK", "2025-09-08")],
            hotels: vec![],
        });
        let (indexer, _store, _dir) = indexer_with(outcome, calendar);

        let long_excerpt = "x".repeat(EXCERPT_CAP * 2);
        let report = indexer.index_text("111", "t", None, &long_excerpt).await;
        let stored = report.flights[0].raw_excerpt.as_ref().unwrap();
        assert_eq!(stored.chars().count(), EXCERPT_CAP);
    }

    #[test]
    fn test_event_start_shapes() {
        assert_eq!(event_start("2025-09-08", Some("14:30")), "2025-09-08T14:30:00");
        assert_eq!(event_start("2025-09-08", None), "2025-09-08T09:00:00");
        assert_eq!(event_start("2025-09-08", Some("late")), "2025-09-08T09:00:00");
    }
}
