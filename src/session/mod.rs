//! Per-session generation gate.
//!
//! ```text
//!              record_call (calls_made >= call_limit)
//!   Active ───────────────────────────────────────────► Exhausted
//!     │
//!     │ mark_completed
//!     ▼
//!   Completed
//! ```
//!
//! `Exhausted` and `Completed` are terminal. State is created lazily on the
//! first [`can_generate`](SessionProgressGate::can_generate) and lives until
//! process exit or [`evict`](SessionProgressGate::evict). The gate counts
//! calls but does not serialize them: callers keep at most one `generate`
//! in flight per session.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default number of generation calls a session may make.
pub const DEFAULT_CALL_LIMIT: u32 = 25;

/// Lifecycle state of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Exhausted,
    Completed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Exhausted => "exhausted",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-memory working copy of one session's gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionGateState {
    pub session_id: String,
    pub calls_made: u32,
    pub call_limit: u32,
    pub status: SessionStatus,
}

impl SessionGateState {
    fn new(session_id: &str, call_limit: u32) -> Self {
        Self {
            session_id: session_id.to_string(),
            calls_made: 0,
            call_limit,
            status: SessionStatus::Active,
        }
    }

    /// Calls left before the session is exhausted.
    pub fn remaining(&self) -> u32 {
        match self.status {
            SessionStatus::Active => self.call_limit.saturating_sub(self.calls_made),
            _ => 0,
        }
    }
}

/// Call counter and state machine for every live session.
#[derive(Debug)]
pub struct SessionProgressGate {
    sessions: Mutex<HashMap<String, SessionGateState>>,
    call_limit: u32,
}

impl SessionProgressGate {
    /// A gate admitting `call_limit` calls per session (minimum 1).
    pub fn new(call_limit: u32) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            call_limit: call_limit.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionGateState>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn call_limit(&self) -> u32 {
        self.call_limit
    }

    /// Whether the session may generate. Unknown sessions start `Active`.
    pub fn can_generate(&self, session_id: &str) -> bool {
        let mut sessions = self.lock();
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionGateState::new(session_id, self.call_limit));
        state.status == SessionStatus::Active
    }

    /// Count one generation call and return the resulting status.
    ///
    /// Calls against a terminal session are ignored; the count never
    /// decreases and never moves a session out of a terminal state.
    pub fn record_call(&self, session_id: &str) -> SessionStatus {
        let mut sessions = self.lock();
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionGateState::new(session_id, self.call_limit));
        if state.status.is_terminal() {
            return state.status;
        }

        state.calls_made = state.calls_made.saturating_add(1);
        if state.calls_made >= state.call_limit {
            state.status = SessionStatus::Exhausted;
            info!(
                session_id,
                calls_made = state.calls_made,
                "session reached its call limit"
            );
        } else {
            debug!(session_id, calls_made = state.calls_made, "generation call recorded");
        }
        state.status
    }

    /// Move the session to `Completed` unless it is already terminal.
    pub fn mark_completed(&self, session_id: &str) -> SessionStatus {
        let mut sessions = self.lock();
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionGateState::new(session_id, self.call_limit));
        if state.status == SessionStatus::Active {
            state.status = SessionStatus::Completed;
            debug!(session_id, calls_made = state.calls_made, "session completed");
        }
        state.status
    }

    /// Current state of a session, if it has been seen.
    pub fn status(&self, session_id: &str) -> Option<SessionGateState> {
        self.lock().get(session_id).cloned()
    }

    /// Forget a session's working copy. Returns the dropped state.
    pub fn evict(&self, session_id: &str) -> Option<SessionGateState> {
        self.lock().remove(session_id)
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionProgressGate {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_session_is_created_active() {
        let gate = SessionProgressGate::default();
        assert!(gate.status("s1").is_none());
        assert!(gate.can_generate("s1"));
        let state = gate.status("s1").unwrap();
        assert_eq!(state.status, SessionStatus::Active);
        assert_eq!(state.calls_made, 0);
        assert_eq!(state.call_limit, DEFAULT_CALL_LIMIT);
    }

    #[test]
    fn limit_exhausts_session() {
        let gate = SessionProgressGate::new(3);
        assert_eq!(gate.record_call("s"), SessionStatus::Active);
        assert_eq!(gate.record_call("s"), SessionStatus::Active);
        assert_eq!(gate.status("s").unwrap().remaining(), 1);
        assert_eq!(gate.record_call("s"), SessionStatus::Exhausted);
        assert!(!gate.can_generate("s"));
    }

    #[test]
    fn terminal_states_do_not_change() {
        let gate = SessionProgressGate::new(2);
        gate.mark_completed("done");
        assert_eq!(gate.record_call("done"), SessionStatus::Completed);
        assert_eq!(gate.status("done").unwrap().calls_made, 0);

        gate.record_call("spent");
        gate.record_call("spent");
        assert_eq!(gate.mark_completed("spent"), SessionStatus::Exhausted);
        assert_eq!(gate.record_call("spent"), SessionStatus::Exhausted);
        assert_eq!(gate.status("spent").unwrap().calls_made, 2);
    }

    #[test]
    fn evict_forgets_session() {
        let gate = SessionProgressGate::new(1);
        gate.record_call("s");
        assert!(!gate.can_generate("s"));
        let dropped = gate.evict("s").unwrap();
        assert_eq!(dropped.status, SessionStatus::Exhausted);
        assert!(gate.can_generate("s"));
    }

    #[test]
    fn zero_limit_is_raised_to_one() {
        let gate = SessionProgressGate::new(0);
        assert_eq!(gate.call_limit(), 1);
        assert!(gate.can_generate("s"));
    }

    #[test]
    fn status_display() {
        assert_eq!(SessionStatus::Exhausted.to_string(), "exhausted");
        assert!(SessionStatus::Completed.is_terminal());
        assert!(!SessionStatus::Active.is_terminal());
    }
}
