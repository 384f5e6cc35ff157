//! Wayfare Watch — flight-status polling, canonical snapshots, and the
//! change-detection engine with notification fan-out.

pub mod engine;
pub mod message;
pub mod provider;
pub mod snapshot;

pub use engine::{WatchEngine, WatchReport};
pub use message::format_status_message;
pub use provider::{AviationstackClient, StatusFetch, StatusSource};
pub use snapshot::CanonicalSnapshot;
