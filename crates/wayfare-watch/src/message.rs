//! Status message formatting: a fixed multi-line layout so tests and
//! readers always see the same shape, absent values rendered as dashes.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::snapshot::CanonicalSnapshot;

/// Render a snapshot as the user-facing status message.
pub fn format_status_message(snap: &CanonicalSnapshot, local_tz: Option<Tz>) -> String {
    let dep = &snap.departure;
    let arr = &snap.arrival;
    let lines = [
        format!("✈️ Flight update {}", snap.flight_label()),
        format!(
            "Status: {} | Airline: {}",
            dash(snap.status.as_deref()),
            dash(snap.airline.as_deref())
        ),
        format!(
            "Departure: {} terminal {} gate {}",
            dash(dep.airport.as_deref()),
            dash(dep.terminal.as_deref()),
            dash(dep.gate.as_deref())
        ),
        format!(
            "Departure times: scheduled {} | estimated {} | actual {}",
            fmt_time_both(dep.scheduled.as_deref(), local_tz),
            fmt_time_both(dep.estimated.as_deref(), local_tz),
            fmt_time_both(dep.actual.as_deref(), local_tz)
        ),
        format!(
            "Arrival: {} terminal {} gate {} (baggage {})",
            dash(arr.airport.as_deref()),
            dash(arr.terminal.as_deref()),
            dash(arr.gate.as_deref()),
            dash(arr.baggage.as_deref())
        ),
        format!(
            "Arrival times: scheduled {} | estimated {} | actual {}",
            fmt_time_both(arr.scheduled.as_deref(), local_tz),
            fmt_time_both(arr.estimated.as_deref(), local_tz),
            fmt_time_both(arr.actual.as_deref(), local_tz)
        ),
    ];
    lines.join("\n")
}

fn dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

/// A timestamp in UTC, with the configured local rendering appended when
/// one is set. Unparseable values pass through verbatim; absent ones
/// become a dash.
fn fmt_time_both(ts: Option<&str>, local_tz: Option<Tz>) -> String {
    let ts = match ts {
        Some(ts) => ts,
        None => return "-".to_string(),
    };
    let parsed = match DateTime::parse_from_rfc3339(ts) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => return ts.to_string(),
    };
    let utc = parsed.format("%Y-%m-%d %H:%M UTC").to_string();
    match local_tz {
        Some(tz) => {
            let local = parsed.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string();
            format!("{} | {} {}", utc, local, tz)
        }
        None => utc,
    }
}
