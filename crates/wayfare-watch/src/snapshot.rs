//! Canonical flight-status snapshots and their stable hash.
//!
//! The snapshot is a fixed-shape projection of a provider record: every
//! field the provider did not populate is an explicit null, and the field
//! order is fixed by the struct, so the hash depends only on the values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Flight identifiers as the provider reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightIdent {
    pub iata: Option<String>,
    pub icao: Option<String>,
    pub number: Option<String>,
}

/// Departure-side fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartureInfo {
    pub airport: Option<String>,
    pub terminal: Option<String>,
    pub gate: Option<String>,
    pub scheduled: Option<String>,
    pub estimated: Option<String>,
    pub actual: Option<String>,
}

/// Arrival-side fields; adds the baggage claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalInfo {
    pub airport: Option<String>,
    pub terminal: Option<String>,
    pub gate: Option<String>,
    pub baggage: Option<String>,
    pub scheduled: Option<String>,
    pub estimated: Option<String>,
    pub actual: Option<String>,
}

/// The normalized projection of one provider flight record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSnapshot {
    pub status: Option<String>,
    pub airline: Option<String>,
    pub flight: FlightIdent,
    pub departure: DepartureInfo,
    pub arrival: ArrivalInfo,
}

impl CanonicalSnapshot {
    /// Build a snapshot from a raw provider record, null-padding anything
    /// absent.
    pub fn from_provider(record: &Value) -> Self {
        Self {
            status: scalar(record, &["flight_status"]),
            airline: scalar(record, &["airline", "name"]),
            flight: FlightIdent {
                iata: scalar(record, &["flight", "iata"]),
                icao: scalar(record, &["flight", "icao"]),
                number: scalar(record, &["flight", "number"]),
            },
            departure: DepartureInfo {
                airport: scalar(record, &["departure", "airport"]),
                terminal: scalar(record, &["departure", "terminal"]),
                gate: scalar(record, &["departure", "gate"]),
                scheduled: scalar(record, &["departure", "scheduled"]),
                estimated: scalar(record, &["departure", "estimated"]),
                actual: scalar(record, &["departure", "actual"]),
            },
            arrival: ArrivalInfo {
                airport: scalar(record, &["arrival", "airport"]),
                terminal: scalar(record, &["arrival", "terminal"]),
                gate: scalar(record, &["arrival", "gate"]),
                baggage: scalar(record, &["arrival", "baggage"]),
                scheduled: scalar(record, &["arrival", "scheduled"]),
                estimated: scalar(record, &["arrival", "estimated"]),
                actual: scalar(record, &["arrival", "actual"]),
            },
        }
    }

    /// Deterministic hash over the canonical serialization. The struct
    /// fixes the key order, so equal snapshots hash equally no matter how
    /// the provider ordered its fields.
    pub fn hash(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Display name for the flight: IATA code, else bare number, else `-`.
    pub fn flight_label(&self) -> &str {
        self.flight
            .iata
            .as_deref()
            .or(self.flight.number.as_deref())
            .unwrap_or("-")
    }
}

/// Walk a path of object keys and normalize the scalar at the end to a
/// string. Null, missing, and non-scalar values are all absent.
fn scalar(record: &Value, path: &[&str]) -> Option<String> {
    let mut current = record;
    for key in path {
        current = current.get(key)?;
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider_record() -> Value {
        json!({
            "flight_status": "active",
            "airline": {"name": "El Al"},
            "flight": {"iata": "LY81", "icao": "ELY81", "number": "81"},
            "departure": {
                "airport": "Ben Gurion",
                "terminal": "3",
                "gate": "B4",
                "scheduled": "2025-09-08T14:30:00+00:00",
            },
            "arrival": {
                "airport": "Suvarnabhumi",
                "baggage": "12",
                "scheduled": "2025-09-09T06:05:00+00:00",
            },
        })
    }

    #[test]
    fn test_absent_fields_are_explicit_nulls() {
        let snap = CanonicalSnapshot::from_provider(&provider_record());
        assert_eq!(snap.departure.actual, None);
        assert_eq!(snap.arrival.gate, None);

        let json = serde_json::to_value(&snap).unwrap();
        assert!(json["departure"]["actual"].is_null());
        assert!(json["arrival"]["gate"].is_null());
    }

    #[test]
    fn test_hash_ignores_provider_key_order() {
        let reordered = json!({
            "arrival": {
                "scheduled": "2025-09-09T06:05:00+00:00",
                "baggage": "12",
                "airport": "Suvarnabhumi",
            },
            "departure": {
                "gate": "B4",
                "scheduled": "2025-09-08T14:30:00+00:00",
                "airport": "Ben Gurion",
                "terminal": "3",
            },
            "flight": {"number": "81", "icao": "ELY81", "iata": "LY81"},
            "airline": {"name": "El Al"},
            "flight_status": "active",
        });
        let a = CanonicalSnapshot::from_provider(&provider_record());
        let b = CanonicalSnapshot::from_provider(&reordered);
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_sensitive_to_gate_change() {
        let mut changed = provider_record();
        changed["departure"]["gate"] = json!("C2");
        let a = CanonicalSnapshot::from_provider(&provider_record());
        let b = CanonicalSnapshot::from_provider(&changed);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_numeric_scalars_normalized() {
        let record = json!({"departure": {"terminal": 3}});
        let snap = CanonicalSnapshot::from_provider(&record);
        assert_eq!(snap.departure.terminal.as_deref(), Some("3"));
    }

    #[test]
    fn test_flight_label_fallbacks() {
        let snap = CanonicalSnapshot::from_provider(&provider_record());
        assert_eq!(snap.flight_label(), "LY81");
        assert_eq!(CanonicalSnapshot::default().flight_label(), "-");
    }
}
