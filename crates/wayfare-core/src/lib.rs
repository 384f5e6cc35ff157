//! Wayfare Core — configuration, error types, capability traits.

pub mod capabilities;
pub mod config;
pub mod error;
pub mod ids;

pub use capabilities::{CalendarEvent, CalendarSync, EventWindow, Notifier};
pub use config::WayfareConfig;
pub use error::{Error, Result};
pub use ids::{new_record_id, normalize_user_id};
