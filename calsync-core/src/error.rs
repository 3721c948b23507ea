//! Error types for the calsync engine.

use thiserror::Error;

/// Errors that can occur during a sync cycle or a single-event push.
///
/// `CursorInvalid` is deliberately its own variant: the orchestrator
/// recovers from it by restarting the listing from a full window, while
/// every other pull-phase error aborts the cycle.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("token refresh failed: {0}")]
    Auth(String),

    #[error("sync cursor is no longer valid")]
    CursorInvalid,

    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no calendar connection for owner '{0}'")]
    NotConnected(String),

    #[error("event not found: {0}")]
    EventNotFound(String),

    #[error("a sync cycle is already running for owner '{0}'")]
    SyncInProgress(String),

    #[error("sync was cancelled")]
    Cancelled,
}

/// Result type alias for calsync operations.
pub type SyncResult<T> = Result<T, SyncError>;
