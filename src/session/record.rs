//! Persisted session record.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::SessionState;

/// Milliseconds since the Unix epoch.
pub type Millis = u64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Millis)
        .unwrap_or(0)
}

/// Why a session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Closed by the sweeper after the inactivity timeout.
    Timeout,
    /// The caller asked for access help; a human follows up out of band.
    Handoff,
    /// The caller chose to leave the menu.
    Exit,
}

/// Conversation state of one remote identity.
///
/// Serialized as `{"identity", "lastActivityAt", "ended"}`; `closeReason`
/// is only written while the session is ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Channel address of the remote party.
    pub identity: String,
    /// Last inbound message or reopen, in epoch milliseconds.
    pub last_activity_at: Millis,
    /// Whether the conversation has been closed.
    pub ended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<CloseReason>,
}

impl Session {
    /// Create an open session for a first contact.
    pub fn new(identity: impl Into<String>, now: Millis) -> Self {
        Self {
            identity: identity.into(),
            last_activity_at: now,
            ended: false,
            close_reason: None,
        }
    }

    /// Current state tag of this record.
    pub fn state(&self) -> SessionState {
        if self.ended {
            SessionState::Closed
        } else {
            SessionState::Active
        }
    }

    /// Refresh the activity timestamp. Never moves it backwards.
    pub fn touch(&mut self, now: Millis) {
        self.last_activity_at = self.last_activity_at.max(now);
    }

    /// Mark the conversation closed.
    pub fn close(&mut self, reason: CloseReason) {
        self.ended = true;
        self.close_reason = Some(reason);
    }

    /// Reopen a closed conversation.
    pub fn reopen(&mut self, now: Millis) {
        self.ended = false;
        self.close_reason = None;
        self.touch(now);
    }

    /// Time elapsed since the last activity.
    pub fn idle_for(&self, now: Millis) -> Duration {
        Duration::from_millis(now.saturating_sub(self.last_activity_at))
    }

    /// Whether an open session has been idle for strictly longer than `timeout`.
    pub fn is_expired(&self, now: Millis, timeout: Duration) -> bool {
        !self.ended && self.idle_for(now) > timeout
    }
}
