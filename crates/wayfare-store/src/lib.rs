//! Wayfare Store — SQLite persistence for travel records, watch
//! subscriptions, and conversation sessions.

pub mod schema;
pub mod sqlite;
pub mod types;

pub use sqlite::TravelStore;
pub use types::*;
