//! Capability traits for external collaborators.
//!
//! The core consumes these; transport, OAuth, and delivery live outside it.
//! Failures behind either trait are logged by callers and never escalate.

use async_trait::async_trait;

use crate::Result;

/// When a calendar event happens: a date span or a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventWindow {
    /// All-day event spanning `start..end` (dates, `YYYY-MM-DD`).
    AllDay { start: String, end: String },
    /// Timed event starting at `start` (`YYYY-MM-DDTHH:MM:SS`).
    Timed { start: String, end: Option<String> },
}

/// An event to place on a user's calendar.
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub window: EventWindow,
}

/// Creates events on a user's external calendar.
#[async_trait]
pub trait CalendarSync: Send + Sync {
    /// Attempt to create an event. Returns `Ok(false)` when the owner has no
    /// linked calendar; `Err` for API failures. Neither is fatal to callers.
    async fn add_event(&self, owner: &str, event: &CalendarEvent) -> Result<bool>;
}

/// Sends a text message to a messaging identifier.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<()>;
}
