//! Menu state machine.
//!
//! Routing is a pure function of the caller's state and the literal message
//! body. The menu position is always the root menu; the only persisted state
//! is whether the session is ended.

use super::Reply;
use crate::error::SupportDeskError;
use crate::session::{CloseReason, Millis, Session, SessionState};
use crate::Result;

/// Numbered options understood by the root menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    /// `0`: show the menu again.
    ShowMenu,
    /// `1`: talk to a human.
    Human,
    /// `2`: fiscal report help.
    Fiscal,
    /// `3`: access problems, handed off to a human.
    Access,
    /// `4`: leave.
    Exit,
    /// `9`: reopen a closed conversation.
    Reopen,
}

impl MenuOption {
    /// Parse a message body. Matching is exact: no trimming, no case folding.
    pub fn parse(body: &str) -> Option<Self> {
        match body {
            "0" => Some(Self::ShowMenu),
            "1" => Some(Self::Human),
            "2" => Some(Self::Fiscal),
            "3" => Some(Self::Access),
            "4" => Some(Self::Exit),
            "9" => Some(Self::Reopen),
            _ => None,
        }
    }
}

/// Session mutation produced by routing one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Leave the record untouched.
    None,
    /// Insert a fresh open session.
    Create,
    /// Refresh the activity timestamp.
    Touch,
    /// Refresh the activity timestamp and close the session.
    Close(CloseReason),
    /// Reopen a closed session.
    Reopen,
}

impl Effect {
    /// Apply this effect to the snapshot for `identity`.
    ///
    /// Effects that need an existing record fail with
    /// [`SupportDeskError::UnknownSession`] when there is none; the snapshot
    /// is left as it was.
    pub fn apply(self, sessions: &mut Vec<Session>, identity: &str, now: Millis) -> Result<()> {
        let position = sessions.iter().position(|s| s.identity == identity);

        match (self, position) {
            (Effect::Create, None) => sessions.push(Session::new(identity, now)),
            (Effect::Create, Some(i)) => {
                tracing::warn!(identity = %identity, "session already on file; refreshing instead");
                sessions[i].touch(now);
            }
            (Effect::Touch, Some(i)) => sessions[i].touch(now),
            (Effect::Close(reason), Some(i)) => {
                sessions[i].touch(now);
                sessions[i].close(reason);
            }
            (Effect::Reopen, Some(i)) => sessions[i].reopen(now),
            (Effect::None, _) => {}
            (_, None) => return Err(SupportDeskError::UnknownSession(identity.to_string())),
        }

        Ok(())
    }
}

/// Result of routing one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Message to send back, if any.
    pub reply: Option<Reply>,
    /// Mutation to fold into the store.
    pub effect: Effect,
}

impl Transition {
    fn new(reply: Reply, effect: Effect) -> Self {
        Self {
            reply: Some(reply),
            effect,
        }
    }

    fn ignore() -> Self {
        Self {
            reply: None,
            effect: Effect::None,
        }
    }

    /// State the caller ends up in after this transition.
    pub fn next_state(&self, current: SessionState) -> SessionState {
        match self.effect {
            Effect::None => current,
            Effect::Create | Effect::Touch | Effect::Reopen => SessionState::Active,
            Effect::Close(_) => SessionState::Closed,
        }
    }
}

/// Stateless router for the root support menu.
#[derive(Debug, Clone, Copy, Default)]
pub struct MenuRouter;

impl MenuRouter {
    pub fn new() -> Self {
        Self
    }

    /// Decide the reply and mutation for `body` sent by a caller in `state`.
    pub fn route(&self, state: SessionState, body: &str) -> Transition {
        let option = MenuOption::parse(body);

        match (state, option) {
            // A first contact always gets the welcome, even when it sends "9".
            (SessionState::New, _) => Transition::new(Reply::Welcome, Effect::Create),

            (SessionState::Closed, Some(MenuOption::Reopen)) => {
                Transition::new(Reply::WelcomeBack, Effect::Reopen)
            }
            (SessionState::Active, Some(MenuOption::Reopen)) => {
                Transition::new(Reply::AlreadyInService, Effect::None)
            }

            (SessionState::Closed, _) => Transition::ignore(),

            (SessionState::Active, Some(MenuOption::Human)) => {
                Transition::new(Reply::HumanContact, Effect::Touch)
            }
            (SessionState::Active, Some(MenuOption::Fiscal)) => {
                Transition::new(Reply::FiscalSupport, Effect::Touch)
            }
            (SessionState::Active, Some(MenuOption::Access)) => Transition::new(
                Reply::AccessTroubleshooting,
                Effect::Close(CloseReason::Handoff),
            ),
            (SessionState::Active, Some(MenuOption::Exit)) => {
                Transition::new(Reply::Farewell, Effect::Close(CloseReason::Exit))
            }
            (SessionState::Active, Some(MenuOption::ShowMenu)) => {
                Transition::new(Reply::Menu, Effect::Touch)
            }
            (SessionState::Active, None) => Transition::new(Reply::InvalidOption, Effect::Touch),
        }
    }
}
