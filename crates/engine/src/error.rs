use thiserror::Error;

use crate::asset::AssetId;

/// Every failure the studio can surface. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StudioError {
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Validation(String),
    #[error("Unknown UI action type: {0}")]
    UnknownActionKind(String),
    #[error("Video {0} is no longer available")]
    StaleReference(AssetId),
}

impl StudioError {
    pub fn validation(message: impl Into<String>) -> Self {
        StudioError::Validation(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        StudioError::Transport(message.into())
    }

    /// Stale references and unknown action kinds are absorbed rather than shown.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            StudioError::StaleReference(_) | StudioError::UnknownActionKind(_)
        )
    }
}

pub type StudioResult<T> = Result<T, StudioError>;
