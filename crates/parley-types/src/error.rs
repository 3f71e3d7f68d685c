use thiserror::Error;

use crate::chat::Message;
use crate::gateway::GatewayError;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from chat, edit, and regeneration operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conversation belongs to another user")]
    Forbidden,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("reply generation failed: {0}")]
    Gateway(GatewayError),

    /// The user message was written, but a later step failed (the gateway
    /// call or storing the reply). `message` is the committed user message.
    #[error("message saved but reply generation failed: {source}")]
    PartialFailure {
        message: Box<Message>,
        source: Box<ChatError>,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ChatError {
    /// Whether user-visible message content was changed before the failure.
    pub fn content_changed(&self) -> bool {
        matches!(self, ChatError::PartialFailure { .. })
    }

    /// Re-classify an error raised after `message` was committed.
    ///
    /// Every such failure becomes `PartialFailure`, whatever its cause, so
    /// callers can always tell that content already changed.
    pub fn after_commit(self, message: &Message) -> Self {
        match self {
            partial @ ChatError::PartialFailure { .. } => partial,
            cause => ChatError::PartialFailure {
                message: Box::new(message.clone()),
                source: Box::new(cause),
            },
        }
    }

    /// The gateway error behind this failure, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            ChatError::Gateway(e) => Some(e),
            ChatError::PartialFailure { source, .. } => source.gateway_error(),
            _ => None,
        }
    }
}

/// Errors related to user and API key management.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("invalid email: '{0}'")]
    InvalidEmail(String),

    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    #[error("storage error: {0}")]
    StorageError(String),
}
