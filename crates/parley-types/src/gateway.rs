//! AI gateway request and error types.
//!
//! A gateway call is a list of prior turns plus a fresh prompt. Turns carry
//! a provider-neutral speaker; concrete gateways map it onto their own role
//! names (Gemini: `user` / `model`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chat::{Message, MessageRole};

/// Speaker of a turn sent to the generative provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// Text the user wrote (the "prompt" side).
    User,
    /// Text the model produced earlier (the "response" side).
    Model,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Model => write!(f, "model"),
        }
    }
}

impl From<MessageRole> for Speaker {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Speaker::User,
            MessageRole::Assistant => Speaker::Model,
        }
    }
}

/// One prior exchange entry supplied as conversation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

impl From<&Message> for Turn {
    fn from(message: &Message) -> Self {
        Self {
            speaker: message.role.into(),
            text: message.content.clone(),
        }
    }
}

/// Errors from AI gateway calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("missing provider credentials ({0} is not set)")]
    MissingCredentials(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited")]
    RateLimited,

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("provider returned an empty response")]
    EmptyResponse,

    #[error("provider call timed out after {0}s")]
    Timeout(u64),
}
