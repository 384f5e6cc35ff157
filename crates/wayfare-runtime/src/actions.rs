//! The closed set of user actions the core consumes.
//!
//! Whatever classifier sits in front (keyword rules, an AI router) emits
//! one of these; raw request strings never reach the core.

use serde::{Deserialize, Serialize};

/// Which upcoming flights a details request refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailScope {
    /// The next upcoming flight.
    #[default]
    Latest,
    /// The return leg: the last of the upcoming set.
    Return,
    /// The first two upcoming flights.
    All,
}

/// One typed user request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum Action {
    /// "What are my flights?"
    ListUserFlights {
        #[serde(default)]
        range_days: Option<i64>,
    },
    /// "What are <contact>'s flights?" — resolved via configured aliases.
    ListContactFlights {
        contact: String,
        #[serde(default)]
        range_days: Option<i64>,
    },
    /// "Track flight LY81 2025-09-08."
    SubscribeFlight {
        code: String,
        #[serde(default)]
        date: Option<String>,
    },
    /// "Stop tracking LY81" / "stop tracking everything".
    CancelFlight {
        #[serde(default)]
        code: Option<String>,
    },
    /// "Status LY81" — on-demand provider query.
    FlightStatus { code: String },
    /// "Give me the flight details."
    FlightDetails {
        #[serde(default)]
        scope: DetailScope,
    },
    /// "List my tracked flights."
    ListWatches,
}
