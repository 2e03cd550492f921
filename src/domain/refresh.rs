//! Supersede-not-queue guard for surface refreshes.
//!
//! Each surface (a watchlist tab, the home feed, ...) may have several fetches
//! in flight, but only the most recently started one may apply its result.
//! Older results are dropped when they arrive; nothing is aborted.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Handle for one started refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    surface: String,
    token: RequestToken,
}

impl RefreshTicket {
    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }
}

#[derive(Debug, Default)]
pub struct RefreshTracker {
    state: Mutex<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    next_token: u64,
    latest: HashMap<String, RequestToken>,
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a refresh for `surface`, superseding any refresh already in flight.
    pub fn begin(&self, surface: &str) -> RefreshTicket {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.next_token += 1;
        let token = RequestToken(state.next_token);
        state.latest.insert(surface.to_string(), token);
        RefreshTicket {
            surface: surface.to_string(),
            token,
        }
    }

    pub fn is_current(&self, ticket: &RefreshTicket) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.latest.get(&ticket.surface) == Some(&ticket.token)
    }

    /// Returns `value` if `ticket` is still the latest refresh for its surface.
    pub fn accept<T>(&self, ticket: &RefreshTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(
                surface = %ticket.surface,
                token = ticket.token.0,
                "discarding superseded refresh result"
            );
            None
        }
    }
}
