use thiserror::Error;

/// Failures of the swipe/match/conversation core.
///
/// Every operation reports one of these to the transport boundary, which
/// decides how to render it. Duplicate-match and duplicate-conversation
/// races never show up here: they are expected under concurrency and are
/// resolved as success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed or missing parameters, or a self-referential action.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The actor is not a participant of the resource they act on.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conversation or message action between users who are not matched.
    #[error("Users are not matched")]
    NotMatched,

    /// A referenced conversation or user does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid credential.
    #[error("Authentication required")]
    Unauthenticated,

    /// Persistence failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap any persistence error as [`CoreError::Internal`].
    pub fn internal(err: impl std::fmt::Display) -> Self {
        CoreError::Internal(err.to_string())
    }

    /// Short machine-readable tag, used in realtime error frames.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidInput(_) => "invalid_input",
            CoreError::Unauthorized(_) => "unauthorized",
            CoreError::NotMatched => "not_matched",
            CoreError::NotFound(_) => "not_found",
            CoreError::Unauthenticated => "unauthenticated",
            CoreError::Internal(_) => "internal",
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
