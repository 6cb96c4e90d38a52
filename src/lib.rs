//! # support-desk
//!
//! Session lifecycle and menu routing for message-based customer support.
//!
//! Each remote identity that writes in gets a session. Open sessions are
//! answered with a numbered menu; choosing a human handoff or exit closes
//! the session, and a background sweep closes sessions that went quiet.
//! A closed session stays silent until the identity sends `9`.
//!
//! ## Features
//!
//! - **Persistent sessions**: One JSON document, serialized load/mutate/save cycles
//! - **Menu routing**: Pure state x message transition table
//! - **Timeout sweeps**: Periodic closure with a single notice per session
//! - **Transport bridge**: REST and WebSocket endpoints for channel adapters
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use support_desk::{BroadcastTransport, InboundEvent, SessionService, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> support_desk::Result<()> {
//!     support_desk::logging::try_init().ok();
//!
//!     let transport = BroadcastTransport::default();
//!     let mut outbound = transport.subscribe();
//!     let service = SessionService::new(SessionStore::file("contacts.json"), Arc::new(transport));
//!
//!     service.handle_inbound(&InboundEvent::new("5511999990000", "hi")).await?;
//!
//!     let msg = outbound.recv().await.expect("welcome message");
//!     println!("to {}: {}", msg.identity, msg.text);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod menu;
pub mod service;
pub mod session;
pub mod sweeper;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SupportDeskError};
pub use menu::{MenuOption, MenuRouter, Reply, ReplyCatalog, SupportContacts};
pub use service::{InboundOutcome, SessionService, SweepReport};
pub use session::{CloseReason, Session, SessionState, SessionStore};
pub use sweeper::TimeoutSweeper;
pub use transport::{BroadcastTransport, InboundEvent, OutboundMessage, Transport};
