//! Message transport contract.
//!
//! The service never talks to a chat network directly. An external adapter
//! delivers inbound events and carries outbound text through a
//! [`Transport`] implementation.

mod broadcast;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use broadcast::BroadcastTransport;

/// One inbound message from a remote identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Channel address of the sender.
    pub identity: String,
    /// Literal message body.
    pub body: String,
}

impl InboundEvent {
    pub fn new(identity: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            body: body.into(),
        }
    }
}

/// One outbound message for a remote identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub identity: String,
    pub text: String,
}

/// Outbound delivery capability.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `text` to `identity`.
    ///
    /// Failures are reported as [`crate::SupportDeskError::TransportSend`];
    /// callers log them and carry on.
    async fn send(&self, identity: &str, text: &str) -> Result<()>;
}
