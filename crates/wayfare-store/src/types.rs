//! Row types for travel records, watch subscriptions, and sessions.

use serde::{Deserialize, Serialize};

/// A persisted flight record. Destination and departure date are always
/// known; everything else is best-effort extraction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightRecord {
    pub id: String,
    pub waid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub dest: String,
    pub depart_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depart_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passengers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_excerpt: Option<String>,
    pub created_at: String,
}

/// A persisted hotel record. Check-in date is always known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotelRecord {
    pub id: String,
    pub waid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hotel_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub checkin_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_excerpt: Option<String>,
    pub created_at: String,
}

/// Insert payload for a flight record. The id and creation timestamp are
/// assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewFlight {
    pub waid: String,
    pub origin: Option<String>,
    pub dest: String,
    pub depart_date: String,
    pub depart_time: Option<String>,
    pub arrival_date: Option<String>,
    pub arrival_time: Option<String>,
    pub airline: Option<String>,
    pub flight_number: Option<String>,
    pub pnr: Option<String>,
    pub passengers: Option<String>,
    pub source_doc_id: Option<String>,
    pub raw_excerpt: Option<String>,
}

/// Insert payload for a hotel record.
#[derive(Debug, Clone, Default)]
pub struct NewHotel {
    pub waid: String,
    pub hotel_name: Option<String>,
    pub city: Option<String>,
    pub checkin_date: String,
    pub checkout_date: Option<String>,
    pub address: Option<String>,
    pub source_doc_id: Option<String>,
    pub raw_excerpt: Option<String>,
}

/// A watch subscription row. Snapshot and hash stay null until the first
/// successful poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchSubscription {
    pub id: i64,
    pub waid: String,
    pub flight_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_date: Option<String>,
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_snapshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One conversation turn in a user session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionTurn {
    pub role: String,
    pub content: String,
}

impl SessionTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".into(), content: content.into() }
    }
}

/// Record counts for the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreCounts {
    pub flights: i64,
    pub hotels: i64,
    pub watches: i64,
}
