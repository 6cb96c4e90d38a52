//! Transport that fans outbound messages out to connected adapters.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{OutboundMessage, Transport};
use crate::error::SupportDeskError;
use crate::Result;

/// Default number of outbound messages buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Publishes outbound messages on a broadcast channel.
///
/// Adapters subscribe (typically through the WebSocket endpoint) and relay
/// each [`OutboundMessage`] to the real chat network. Sending while no
/// adapter is subscribed is a delivery failure.
#[derive(Debug, Clone)]
pub struct BroadcastTransport {
    tx: broadcast::Sender<OutboundMessage>,
}

impl BroadcastTransport {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive every message sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.tx.subscribe()
    }

    /// Number of connected adapters.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Transport for BroadcastTransport {
    async fn send(&self, identity: &str, text: &str) -> Result<()> {
        let message = OutboundMessage {
            identity: identity.to_string(),
            text: text.to_string(),
        };

        self.tx
            .send(message)
            .map(|_| ())
            .map_err(|_| SupportDeskError::transport(identity, "no transport adapter connected"))
    }
}
