//! Per-client session records and the table that owns them.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Integer tag a caller uses to identify itself. Not authenticated.
pub type ClientId = i64;

/// One client's current admission window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// When the window began.
    pub started_at: Instant,
    /// Requests counted in this window.
    pub count: u32,
}

impl Session {
    fn fresh(now: Instant) -> Self {
        Self {
            started_at: now,
            count: 0,
        }
    }

    /// A window that has lasted `window` or longer is over.
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.started_at) >= window
    }
}

/// Mapping from client identifier to its session.
///
/// The table itself is not synchronized; the controller wraps it in a single
/// mutex so that `record` runs as one critical section.
#[derive(Debug, Default)]
pub struct SessionTable {
    sessions: HashMap<ClientId, Session>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request for `client_id` at `now` and return the new count.
    ///
    /// Missing or expired sessions are replaced by a fresh window first.
    pub fn record(&mut self, client_id: ClientId, now: Instant, window: Duration) -> u32 {
        let session = self
            .sessions
            .entry(client_id)
            .or_insert_with(|| Session::fresh(now));

        if session.is_expired(now, window) {
            *session = Session::fresh(now);
        }

        session.count = session.count.saturating_add(1);
        session.count
    }

    /// Drop every session whose window is over. Returns how many were removed.
    pub fn remove_expired(&mut self, now: Instant, window: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| !session.is_expired(now, window));
        before - self.sessions.len()
    }

    pub fn get(&self, client_id: ClientId) -> Option<&Session> {
        self.sessions.get(&client_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
