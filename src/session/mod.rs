//! Session management module.
//!
//! This module provides the persisted session record, its lifecycle state
//! tag, and the store that serializes every read-modify-write cycle.

mod record;
mod state;
mod store;

pub use record::{now_millis, CloseReason, Millis, Session};
pub use state::SessionState;
pub use store::{FileStorage, MemoryStorage, SessionStorage, SessionStore};
