//! Extracted-but-not-yet-persisted booking candidates, and promotion from
//! untrusted completion-service JSON into typed values.
//!
//! The model's output is never trusted structurally: every field is pulled
//! out individually and anything that isn't a usable string is dropped.

use serde::Serialize;
use serde_json::Value;

/// A flight candidate. Storable only with a destination and departure date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlightCandidate {
    pub origin: Option<String>,
    pub dest: Option<String>,
    pub depart_date: Option<String>,
    pub depart_time: Option<String>,
    pub arrival_date: Option<String>,
    pub arrival_time: Option<String>,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub pnr: Option<String>,
    pub passengers: Option<String>,
}

impl FlightCandidate {
    /// The minimum-field gate: destination and departure date must be known.
    pub fn is_storable(&self) -> bool {
        self.dest.is_some() && self.depart_date.is_some()
    }
}

/// A hotel candidate. Storable only with a check-in date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HotelCandidate {
    pub hotel_name: Option<String>,
    pub city: Option<String>,
    pub checkin_date: Option<String>,
    pub checkout_date: Option<String>,
    pub address: Option<String>,
}

impl HotelCandidate {
    pub fn is_storable(&self) -> bool {
        self.checkin_date.is_some()
    }
}

/// Candidate lists produced by one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingCandidates {
    pub flights: Vec<FlightCandidate>,
    pub hotels: Vec<HotelCandidate>,
}

impl BookingCandidates {
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty() && self.hotels.is_empty()
    }
}

/// Promote untrusted JSON into candidates, field by field.
///
/// Accepts the documented shape (`flights`/`hotels` arrays) and the legacy
/// singular `flight`/`hotel` object keys, which are wrapped into
/// single-element lists. Non-object entries are skipped.
pub fn candidates_from_json(value: &Value) -> BookingCandidates {
    BookingCandidates {
        flights: entries(value, "flights", "flight")
            .into_iter()
            .filter_map(flight_from_json)
            .collect(),
        hotels: entries(value, "hotels", "hotel")
            .into_iter()
            .filter_map(hotel_from_json)
            .collect(),
    }
}

fn flight_from_json(entry: &Value) -> Option<FlightCandidate> {
    if !entry.is_object() {
        return None;
    }
    Some(FlightCandidate {
        origin: text_field(entry, "origin"),
        dest: text_field(entry, "dest"),
        depart_date: text_field(entry, "depart_date"),
        depart_time: text_field(entry, "depart_time"),
        arrival_date: text_field(entry, "arrival_date"),
        arrival_time: text_field(entry, "arrival_time"),
        airline: text_field(entry, "airline"),
        flight_number: text_field(entry, "flight_number"),
        pnr: text_field(entry, "pnr"),
        passengers: passenger_field(entry),
    })
}

fn hotel_from_json(entry: &Value) -> Option<HotelCandidate> {
    if !entry.is_object() {
        return None;
    }
    Some(HotelCandidate {
        hotel_name: text_field(entry, "hotel_name"),
        city: text_field(entry, "city"),
        checkin_date: text_field(entry, "checkin_date"),
        checkout_date: text_field(entry, "checkout_date"),
        address: text_field(entry, "address"),
    })
}

/// The plural array when present, else a singular object wrapped into a
/// one-element list.
fn entries<'a>(value: &'a Value, plural: &str, singular: &str) -> Vec<&'a Value> {
    if let Some(arr) = value.get(plural).and_then(Value::as_array) {
        return arr.iter().collect();
    }
    match value.get(singular) {
        Some(obj) if obj.is_object() => vec![obj],
        _ => Vec::new(),
    }
}

/// A trimmed, non-empty string field; anything else is treated as absent.
fn text_field(entry: &Value, key: &str) -> Option<String> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Passenger names: a display string, or an array of names joined with
/// commas.
fn passenger_field(entry: &Value) -> Option<String> {
    match entry.get("passengers") {
        Some(Value::Array(names)) => {
            let joined: Vec<&str> = names
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join(", "))
            }
        }
        _ => text_field(entry, "passengers"),
    }
}
