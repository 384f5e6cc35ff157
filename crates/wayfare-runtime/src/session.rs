//! Per-user conversation sessions with an explicit lifecycle: load at
//! request start, save (or discard) at request end. No process-wide state.

use tracing::warn;

use wayfare_store::{SessionTurn, TravelStore};

/// Turns kept per user between requests.
pub const HISTORY_CAP: usize = 20;
/// Turns handed to the completion service as context.
pub const CONTEXT_WINDOW: usize = 8;

/// One user's conversation history for the duration of a request.
#[derive(Debug, Clone)]
pub struct Session {
    waid: String,
    turns: Vec<SessionTurn>,
}

impl Session {
    /// Load the saved session, or start empty. A storage failure degrades
    /// to an empty session rather than failing the request.
    pub fn load(store: &TravelStore, waid: &str) -> Self {
        let turns = match store.load_session(waid) {
            Ok(turns) => turns,
            Err(e) => {
                warn!("Session load failed for {}: {}", waid, e);
                Vec::new()
            }
        };
        Self { waid: waid.to_string(), turns }
    }

    /// Record one request/reply exchange.
    pub fn record(&mut self, user: &str, assistant: &str) {
        self.turns.push(SessionTurn::user(user));
        self.turns.push(SessionTurn::assistant(assistant));
    }

    /// The trailing turns used as completion context.
    pub fn context(&self) -> &[SessionTurn] {
        let start = self.turns.len().saturating_sub(CONTEXT_WINDOW);
        &self.turns[start..]
    }

    /// Persist the session, trimmed to the history cap. Failures are
    /// logged; the request outcome is unaffected.
    pub fn save(&mut self, store: &TravelStore) {
        let start = self.turns.len().saturating_sub(HISTORY_CAP);
        self.turns.drain(..start);
        if let Err(e) = store.save_session(&self.waid, &self.turns) {
            warn!("Session save failed for {}: {}", self.waid, e);
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
