//! Error types for the avatar session.

use crate::catalog::ModelId;

/// Failure reported by a rendering or loader collaborator.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for BackendError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for BackendError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Errors surfaced by the session controller.
///
/// `SurfaceInit`, `ModelLoad` and `InvalidLayout` are recovered inside the
/// session and only ever show up as `last_error` text. `TornDown` and
/// `AlreadyInitialized` are misuse and are returned to the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("Could not create the rendering surface: {0}")]
    SurfaceInit(BackendError),

    #[error("Failed to load model '{model}': {reason}")]
    ModelLoad { model: ModelId, reason: BackendError },

    #[error("Failed to load model '{model}': model reported empty dimensions")]
    InvalidLayout { model: ModelId },

    #[error("session has been torn down")]
    TornDown,

    #[error("session is already initialized")]
    AlreadyInitialized,
}

impl SessionError {
    /// Errors that indicate a programming mistake rather than a runtime failure.
    #[inline]
    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::TornDown | Self::AlreadyInitialized)
    }
}
