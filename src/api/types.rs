//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::error::SupportDeskError;
use crate::service::InboundOutcome;
use crate::session::{CloseReason, Millis, Session, SessionState};

/// Inbound message posted by a transport adapter.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundRequest {
    /// Channel address of the sender.
    pub identity: String,
    /// Literal message body.
    #[serde(default)]
    pub body: String,
}

/// Result of handling an inbound message.
#[derive(Debug, Clone, Serialize)]
pub struct InboundResponse {
    pub identity: String,
    /// State after the message was handled.
    pub state: SessionState,
    pub ended: bool,
    /// Text sent back, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// Whether a connected adapter accepted the reply.
    pub delivered: bool,
}

impl From<InboundOutcome> for InboundResponse {
    fn from(outcome: InboundOutcome) -> Self {
        Self {
            ended: outcome.state == SessionState::Closed,
            identity: outcome.identity,
            state: outcome.state,
            reply: outcome.reply,
            delivered: outcome.delivered,
        }
    }
}

/// Session summary for listing and lookup.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub identity: String,
    pub state: SessionState,
    pub ended: bool,
    pub last_activity_at: Millis,
    pub idle_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_reason: Option<CloseReason>,
}

impl SessionSummary {
    pub fn from_session(session: &Session, now: Millis) -> Self {
        Self {
            identity: session.identity.clone(),
            state: session.state(),
            ended: session.ended,
            last_activity_at: session.last_activity_at,
            idle_seconds: session.idle_for(now).as_secs_f64(),
            close_reason: session.close_reason,
        }
    }
}

/// List sessions response.
#[derive(Debug, Clone, Serialize)]
pub struct ListSessionsResponse {
    /// Total number of sessions.
    pub count: usize,
    /// Number of sessions still open.
    pub active: usize,
    /// Session summaries in storage order.
    pub sessions: Vec<SessionSummary>,
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "SESSION_NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn session_not_found(identity: &str) -> Self {
        Self::new(
            "SESSION_NOT_FOUND",
            format!("No session for '{}'", identity),
        )
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::new("STORAGE_UNAVAILABLE", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

impl From<&SupportDeskError> for ErrorResponse {
    fn from(err: &SupportDeskError) -> Self {
        match err {
            SupportDeskError::StorageUnavailable(_)
            | SupportDeskError::Io(_)
            | SupportDeskError::Serialization(_) => Self::storage_unavailable(err.to_string()),
            SupportDeskError::UnknownSession(identity) => Self::session_not_found(identity),
            _ => Self::internal_error(err.to_string()),
        }
    }
}

/// WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Adapter delivers a message received from a remote identity.
    Inbound { identity: String, body: String },
    /// Server asks the adapter to deliver text to a remote identity.
    Outbound { identity: String, text: String },
    /// Adapter reports the channel is connected; sessions are reset.
    Ready,
    /// Error message.
    Error { code: String, message: String },
    /// Ping/pong for connection health.
    Ping,
    Pong,
}

impl WsMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_request_body_defaults_empty() {
        let req: InboundRequest = serde_json::from_str(r#"{"identity": "A"}"#).unwrap();
        assert_eq!(req.identity, "A");
        assert_eq!(req.body, "");
    }

    #[test]
    fn test_inbound_response_from_outcome() {
        let outcome = InboundOutcome {
            identity: "A".into(),
            previous: SessionState::Active,
            state: SessionState::Closed,
            reply: Some("bye".into()),
            delivered: false,
        };

        let json = serde_json::to_value(InboundResponse::from(outcome)).unwrap();
        assert_eq!(json["state"], "closed");
        assert_eq!(json["ended"], true);
        assert_eq!(json["reply"], "bye");
    }

    #[test]
    fn test_silent_outcome_omits_reply() {
        let outcome = InboundOutcome {
            identity: "A".into(),
            previous: SessionState::Closed,
            state: SessionState::Closed,
            reply: None,
            delivered: false,
        };

        let json = serde_json::to_string(&InboundResponse::from(outcome)).unwrap();
        assert!(!json.contains("reply"));
    }

    #[test]
    fn test_session_summary() {
        let session = Session::new("A", 1_000);
        let summary = SessionSummary::from_session(&session, 3_500);
        assert_eq!(summary.idle_seconds, 2.5);
        assert_eq!(summary.state, SessionState::Active);
    }

    #[test]
    fn test_error_response_from_storage_error() {
        let err = SupportDeskError::StorageUnavailable("disk full".into());
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.code, "STORAGE_UNAVAILABLE");
    }

    #[test]
    fn test_ws_message_inbound_parse() {
        let json = r#"{"type": "inbound", "identity": "A", "body": "1"}"#;
        let msg: WsMessage = serde_json::from_str(json).unwrap();
        match msg {
            WsMessage::Inbound { identity, body } => {
                assert_eq!(identity, "A");
                assert_eq!(body, "1");
            }
            _ => panic!("Expected Inbound message"),
        }
    }

    #[test]
    fn test_ws_message_outbound_serialize() {
        let msg = WsMessage::Outbound {
            identity: "A".into(),
            text: "hello".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"outbound""#));
    }

    #[test]
    fn test_ws_message_ready_parse() {
        let msg: WsMessage = serde_json::from_str(r#"{"type": "ready"}"#).unwrap();
        assert!(matches!(msg, WsMessage::Ready));
    }
}
