//! WebSocket bridge for transport adapters.
//!
//! An adapter connects once, forwards every received chat message as an
//! `inbound` frame and delivers every `outbound` frame it is pushed.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use super::handlers::AppState;
use super::types::WsMessage;
use crate::transport::InboundEvent;

type WsSink = SplitSink<WebSocket, Message>;

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_json(sink: &mut WsSink, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(_) => true,
    }
}

/// Handle one adapter connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut outbound = state.transport.subscribe();
    let (mut sink, mut stream) = socket.split();

    tracing::info!(
        adapters = state.transport.subscriber_count(),
        "transport adapter connected"
    );

    loop {
        tokio::select! {
            pushed = outbound.recv() => match pushed {
                Ok(msg) => {
                    let frame = WsMessage::Outbound {
                        identity: msg.identity,
                        text: msg.text,
                    };
                    if !send_json(&mut sink, &frame).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "adapter fell behind; outbound messages dropped");
                    let err = WsMessage::error("LAGGED", format!("{} outbound messages dropped", skipped));
                    if !send_json(&mut sink, &err).await {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text.to_string(),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                        continue;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(_)) => break,
                };

                let ws_msg: WsMessage = match serde_json::from_str(&text) {
                    Ok(m) => m,
                    Err(e) => {
                        let err = WsMessage::error("PARSE_ERROR", e.to_string());
                        if !send_json(&mut sink, &err).await {
                            break;
                        }
                        continue;
                    }
                };

                if let Some(reply) = handle_frame(&state, ws_msg).await {
                    if !send_json(&mut sink, &reply).await {
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("transport adapter disconnected");
}

/// Apply one adapter frame. Replies to inbound messages go out through the
/// broadcast channel, so only direct answers are returned here.
async fn handle_frame(state: &AppState, msg: WsMessage) -> Option<WsMessage> {
    match msg {
        WsMessage::Inbound { identity, body } => {
            let event = InboundEvent::new(identity, body);
            match state.service.handle_inbound(&event).await {
                Ok(_) => None,
                Err(e) => Some(WsMessage::error("INBOUND_FAILED", e.to_string())),
            }
        }
        WsMessage::Ready => match state.service.reset().await {
            Ok(()) => {
                tracing::info!("transport ready; sessions reset");
                None
            }
            Err(e) => Some(WsMessage::error("STORAGE_UNAVAILABLE", e.to_string())),
        },
        WsMessage::Ping => Some(WsMessage::Pong),
        // Server-to-adapter frames are ignored when echoed back.
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionState;

    #[tokio::test]
    async fn test_inbound_frame_replies_through_broadcast() {
        let state = AppState::new();
        let mut rx = state.transport.subscribe();

        let frame = WsMessage::Inbound {
            identity: "A".into(),
            body: "hi".into(),
        };
        assert!(handle_frame(&state, frame).await.is_none());

        let pushed = rx.recv().await.unwrap();
        assert_eq!(pushed.identity, "A");
        assert_eq!(
            state.service.session("A").map(|s| s.state()),
            Some(SessionState::Active)
        );
    }

    #[tokio::test]
    async fn test_ready_frame_resets_sessions() {
        let state = AppState::new();
        let _rx = state.transport.subscribe();
        let frame = WsMessage::Inbound {
            identity: "A".into(),
            body: "hi".into(),
        };
        handle_frame(&state, frame).await;
        assert_eq!(state.service.sessions().len(), 1);

        assert!(handle_frame(&state, WsMessage::Ready).await.is_none());
        assert!(state.service.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_ping_frame() {
        let state = AppState::new();
        let reply = handle_frame(&state, WsMessage::Ping).await;
        assert!(matches!(reply, Some(WsMessage::Pong)));
    }
}
