//! HTTP and WebSocket bridge between chat transports and the session service.
//!
//! A transport adapter owns the actual channel connection. It posts each
//! received message here and delivers whatever text the service pushes back.
//!
//! ## Endpoints
//!
//! ### Health & Info
//! - `GET /health` - Health check
//! - `GET /api/v1/` - API information
//!
//! ### Messages
//! - `POST /api/v1/messages` - Handle one inbound message
//! - `POST /api/v1/ready` - Transport connected; reset all sessions
//! - `POST /api/v1/sweep` - Run a timeout sweep now
//! - `WS /api/v1/ws` - Adapter connection (inbound and outbound frames)
//!
//! ### Sessions
//! - `GET /api/v1/sessions` - List all sessions
//! - `GET /api/v1/sessions/{identity}` - Get one session
//!
//! ## Example
//!
//! ```no_run
//! use support_desk::api::{ServerConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> support_desk::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1", 3000);
//!     serve(config).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;
pub mod websocket;

pub use handlers::AppState;
pub use router::{create_router, create_router_with_state, serve, serve_with_state, ServerConfig};
pub use types::{
    ErrorResponse, InboundRequest, InboundResponse, ListSessionsResponse, SessionSummary,
    WsMessage,
};
