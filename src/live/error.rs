// Live view error types and result aliases

use thiserror::Error;

use super::types::PlaybackError;

/// Result type for live view operations
pub type LiveResult<T> = Result<T, LiveViewError>;

/// Error types for the live view orchestrator
///
/// Storage failures never surface here; the preference store recovers them
/// internally. Backend playback failures escape to the host exactly once and
/// force immediate fallback to the still surface.
#[derive(Debug, Error)]
pub enum LiveViewError {
    /// The selected transport cannot run in this environment
    #[error("Unsupported mode: {0}")]
    Unsupported(String),

    /// A backend reported an unrecoverable playback failure
    #[error("Playback error: {0}")]
    Playback(PlaybackError),

    /// Operation not valid in the current orchestration state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The view's event loop is no longer running
    #[error("View closed: {0}")]
    ViewClosed(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LiveViewError {
    /// Create an unsupported-mode error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create a view-closed error
    pub fn view_closed(msg: impl Into<String>) -> Self {
        Self::ViewClosed(msg.into())
    }
}

impl From<PlaybackError> for LiveViewError {
    fn from(error: PlaybackError) -> Self {
        Self::Playback(error)
    }
}
