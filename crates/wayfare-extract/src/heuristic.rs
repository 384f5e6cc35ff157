//! Heuristic booking recognition — regex scans for dates, times, and routes.
//!
//! This is the deterministic fallback behind the AI extractor: it yields at
//! most one flight candidate and only when a destination resolves.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::candidates::FlightCandidate;

static YMD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})").unwrap());
static DMY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[./-](\d{1,2})[./-](\d{4})").unwrap());
static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2}):(\d{2})\b").unwrap());
static AIRPORT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{3}\b").unwrap());

/// City-name → airport-code lookup, matched case-insensitively as
/// substrings. Order matters: the first hit becomes the origin.
static CITY_CODES: &[(&str, &str)] = &[
    ("bangkok", "BKK"),
    ("phuket", "HKT"),
    ("chiang mai", "CNX"),
    ("koh samui", "USM"),
    ("krabi", "KBV"),
    ("tel aviv", "TLV"),
];

/// All valid calendar dates found in the text, normalized to `YYYY-MM-DD`,
/// deduplicated in first-seen order. Recognizes `YYYY-MM-DD` and
/// `DD-MM-YYYY` shapes with `-`, `/`, or `.` separators.
pub fn parse_dates(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in YMD_RE.captures_iter(text) {
        push_valid_date(&mut out, num(&cap[1]), num(&cap[2]), num(&cap[3]));
    }
    for cap in DMY_RE.captures_iter(text) {
        push_valid_date(&mut out, num(&cap[3]), num(&cap[2]), num(&cap[1]));
    }
    out
}

fn push_valid_date(out: &mut Vec<String>, y: u32, m: u32, d: u32) {
    if NaiveDate::from_ymd_opt(y as i32, m, d).is_some() {
        let s = format!("{:04}-{:02}-{:02}", y, m, d);
        if !out.contains(&s) {
            out.push(s);
        }
    }
}

/// All plausible `HH:MM` times in the text, zero-padded, deduplicated in
/// first-seen order. Hours outside 0–23 and minutes outside 0–59 are
/// discarded.
pub fn parse_times(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for cap in TIME_RE.captures_iter(text) {
        let (h, m) = (num(&cap[1]), num(&cap[2]));
        if h <= 23 && m <= 59 {
            let s = format!("{:02}:{:02}", h, m);
            if !out.contains(&s) {
                out.push(s);
            }
        }
    }
    out
}

/// Best-effort (origin, destination) resolution.
///
/// Two or more bare 3-letter uppercase tokens win outright: first is the
/// origin, second the destination. A single token is taken as the
/// destination. Otherwise city names are scanned: first match is the
/// origin, the next distinct match the destination. A destination with no
/// origin gets the configured home airport.
pub fn detect_route(text: &str, home_airport: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = AIRPORT_TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect();

    let (mut origin, dest) = if tokens.len() >= 2 {
        (Some(tokens[0].to_string()), Some(tokens[1].to_string()))
    } else if tokens.len() == 1 {
        (None, Some(tokens[0].to_string()))
    } else {
        let lower = text.to_lowercase();
        let mut origin = None;
        let mut dest = None;
        for (name, code) in CITY_CODES {
            if lower.contains(name) {
                if origin.is_none() {
                    origin = Some(code.to_string());
                } else if dest.is_none() && origin.as_deref() != Some(code) {
                    dest = Some(code.to_string());
                }
            }
        }
        (origin, dest)
    };

    if dest.is_some() && origin.is_none() {
        origin = Some(home_airport.to_string());
    }
    (origin, dest)
}

/// The heuristic flight candidate: present only when a destination
/// resolved. Departure date/time come from the first recognized date/time.
pub fn heuristic_candidate(text: &str, home_airport: &str) -> Option<FlightCandidate> {
    let (origin, dest) = detect_route(text, home_airport);
    let dest = dest?;
    let dates = parse_dates(text);
    let times = parse_times(text);
    Some(FlightCandidate {
        origin,
        dest: Some(dest),
        depart_date: dates.first().cloned(),
        depart_time: times.first().cloned(),
        ..Default::default()
    })
}

fn num(s: &str) -> u32 {
    s.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dates_rejects_invalid() {
        assert!(parse_dates("leaving on 2025-13-40 maybe").is_empty());
        assert!(parse_dates("or 31.02.2025 perhaps").is_empty());
    }

    #[test]
    fn test_parse_dates_dedupes_first_seen() {
        let dates = parse_dates("out 2025-09-08, back check 2025-09-08 then 2025-09-20");
        assert_eq!(dates, vec!["2025-09-08", "2025-09-20"]);
    }

    #[test]
    fn test_parse_dates_day_first_shape() {
        assert_eq!(parse_dates("flying 08/09/2025"), vec!["2025-09-08"]);
        assert_eq!(parse_dates("flying 8.9.2025"), vec!["2025-09-08"]);
    }

    #[test]
    fn test_parse_times() {
        let times = parse_times("boards 7:05, departs 14:30, not 25:10 or 14:30 again");
        assert_eq!(times, vec!["07:05", "14:30"]);
    }

    #[test]
    fn test_route_from_bare_tokens() {
        let (origin, dest) = detect_route("TLV to BKK tomorrow", "TLV");
        assert_eq!(origin.as_deref(), Some("TLV"));
        assert_eq!(dest.as_deref(), Some("BKK"));
    }

    #[test]
    fn test_route_single_token_defaults_home_origin() {
        let (origin, dest) = detect_route("Flight to BKK on 2025-09-08", "TLV");
        assert_eq!(origin.as_deref(), Some("TLV"));
        assert_eq!(dest.as_deref(), Some("BKK"));
    }

    #[test]
    fn test_route_from_city_names() {
        let (origin, dest) = detect_route("from tel aviv to Phuket next week", "TLV");
        assert_eq!(origin.as_deref(), Some("TLV"));
        assert_eq!(dest.as_deref(), Some("HKT"));
    }

    #[test]
    fn test_candidate_requires_destination() {
        assert!(heuristic_candidate("no travel details here", "TLV").is_none());

        let candidate = heuristic_candidate("Flight to BKK on 2025-09-08 at 14:30", "TLV")
            .expect("destination resolved");
        assert_eq!(candidate.origin.as_deref(), Some("TLV"));
        assert_eq!(candidate.dest.as_deref(), Some("BKK"));
        assert_eq!(candidate.depart_date.as_deref(), Some("2025-09-08"));
        assert_eq!(candidate.depart_time.as_deref(), Some("14:30"));
    }
}
