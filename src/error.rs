//! Error types for support-desk.

use thiserror::Error;

/// Main error type for support-desk operations.
#[derive(Error, Debug)]
pub enum SupportDeskError {
    /// Backing storage is missing or unreadable.
    #[error("session storage unavailable: {0}")]
    StorageUnavailable(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session snapshot could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport refused or failed to deliver an outbound message.
    #[error("failed to send to {identity}: {reason}")]
    TransportSend { identity: String, reason: String },

    /// A command referenced an identity with no session on file.
    #[error("no session for identity: {0}")]
    UnknownSession(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// A store cycle on the blocking pool panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl SupportDeskError {
    /// Build a transport failure for the given identity.
    pub fn transport(identity: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::TransportSend {
            identity: identity.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience Result type for support-desk operations.
pub type Result<T> = std::result::Result<T, SupportDeskError>;
