//! Session state tag.

use serde::Serialize;

use super::Session;

/// Where an identity stands in the conversation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No record on file for this identity.
    #[default]
    New,
    /// Conversation open; menu replies are sent.
    Active,
    /// Conversation closed; only a reopen command is answered.
    Closed,
}

impl SessionState {
    /// Derive the state of an identity from its record, if any.
    pub fn of(session: Option<&Session>) -> Self {
        session.map(Session::state).unwrap_or_default()
    }

    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - New -> Active
    /// - Active -> Closed
    /// - Closed -> Active
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (*self, target),
            (New, Active) | (Active, Closed) | (Closed, Active)
        )
    }

    /// Check if the session receives automatic replies.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    /// Lowercase name used on the HTTP surface and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::New => "new",
            SessionState::Active => "active",
            SessionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
