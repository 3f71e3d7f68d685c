//! Conversation and message types for Parley.
//!
//! A conversation is an ordered transcript owned by one user. Messages carry
//! their position (`order_index`) and a version lineage that records every
//! in-place content overwrite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who authored a message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'assistant'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A conversation thread owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every append or edit within the conversation.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Maximum title length (in characters) derived from the first message.
    pub const MAX_TITLE_CHARS: usize = 60;

    /// Start a new conversation for `user_id`, titled from its first message.
    pub fn new(user_id: Uuid, first_message: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            title: title_from_message(first_message),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Derive a conversation title from the opening message.
///
/// Whitespace is collapsed; titles longer than
/// [`Conversation::MAX_TITLE_CHARS`] are cut and end with an ellipsis.
pub fn title_from_message(message: &str) -> String {
    let collapsed = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return "New conversation".to_string();
    }
    if collapsed.chars().count() <= Conversation::MAX_TITLE_CHARS {
        return collapsed;
    }
    let cut: String = collapsed
        .chars()
        .take(Conversation::MAX_TITLE_CHARS - 3)
        .collect();
    format!("{}...", cut.trim_end())
}

/// A single message within a conversation.
///
/// `version_number` starts at 1 and grows by exactly one per content
/// overwrite. `original_content` is captured on the first overwrite and never
/// touched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub original_content: Option<String>,
    pub edited_content: Option<String>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub version_number: u32,
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// A fresh, never-edited message at `order_index`.
    pub fn new(
        conversation_id: Uuid,
        role: MessageRole,
        content: impl Into<String>,
        order_index: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            conversation_id,
            role,
            content: content.into(),
            original_content: None,
            edited_content: None,
            is_edited: false,
            edited_at: None,
            version_number: 1,
            order_index,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Result of sending a new user message: the (possibly new) conversation,
/// the stored user message, and the generated reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatExchange {
    pub conversation: Conversation,
    pub user_message: Message,
    pub reply: Message,
}

/// Result of a regeneration: the user message it was driven by (edited or
/// not) and the overwritten assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenerationOutcome {
    pub user_message: Message,
    pub reply: Message,
}

/// Result of editing a user message. `reply` is `None` when no assistant
/// reply followed the edited message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOutcome {
    pub user_message: Message,
    pub reply: Option<Message>,
}

/// A conversation with its full transcript in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// One entry of a message's visible version history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageVersion {
    pub version: u32,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_original: bool,
    #[serde(default)]
    pub is_current: bool,
}

/// Neighbouring messages by order index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageNavigation {
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_message_id: Option<Uuid>,
    pub next_message_id: Option<Uuid>,
}

/// Current message plus navigation and version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageVersions {
    pub current_message: Message,
    pub navigation: MessageNavigation,
    pub versions: Vec<MessageVersion>,
}

impl MessageVersions {
    /// Build the version view for `message`.
    ///
    /// Unedited messages have an empty history. Edited messages expose the
    /// original (version 1) and the current version.
    pub fn for_message(
        message: Message,
        previous: Option<&Message>,
        next: Option<&Message>,
    ) -> Self {
        let versions = if message.is_edited {
            vec![
                MessageVersion {
                    version: 1,
                    content: message
                        .original_content
                        .clone()
                        .unwrap_or_else(|| message.content.clone()),
                    timestamp: message.created_at,
                    is_original: true,
                    is_current: false,
                },
                MessageVersion {
                    version: message.version_number,
                    content: message.content.clone(),
                    timestamp: message.edited_at.unwrap_or(message.updated_at),
                    is_original: false,
                    is_current: true,
                },
            ]
        } else {
            Vec::new()
        };

        Self {
            navigation: MessageNavigation {
                has_previous: previous.is_some(),
                has_next: next.is_some(),
                previous_message_id: previous.map(|m| m.id),
                next_message_id: next.map(|m| m.id),
            },
            current_message: message,
            versions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
        assert!("system".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_message_role_serde() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_new_message_starts_at_version_one() {
        let msg = Message::new(Uuid::now_v7(), MessageRole::User, "Hi", 0, Utc::now());
        assert_eq!(msg.version_number, 1);
        assert!(!msg.is_edited);
        assert!(msg.original_content.is_none());
        assert!(msg.edited_at.is_none());
    }

    #[test]
    fn test_title_short_message_kept() {
        assert_eq!(title_from_message("  Hello   there \n"), "Hello there");
    }

    #[test]
    fn test_title_long_message_truncated() {
        let long = "word ".repeat(40);
        let title = title_from_message(&long);
        assert!(title.ends_with("..."));
        assert!(title.chars().count() <= Conversation::MAX_TITLE_CHARS);
    }

    #[test]
    fn test_title_blank_message() {
        assert_eq!(title_from_message("   "), "New conversation");
    }

    #[test]
    fn test_versions_for_unedited_message_is_empty() {
        let msg = Message::new(Uuid::now_v7(), MessageRole::User, "Hi", 0, Utc::now());
        let view = MessageVersions::for_message(msg, None, None);
        assert!(view.versions.is_empty());
        assert!(!view.navigation.has_previous);
        assert!(!view.navigation.has_next);
    }

    #[test]
    fn test_versions_for_edited_message() {
        let conversation_id = Uuid::now_v7();
        let now = Utc::now();
        let mut msg = Message::new(conversation_id, MessageRole::User, "Hi there", 0, now);
        msg.original_content = Some("Hi".to_string());
        msg.is_edited = true;
        msg.edited_at = Some(now);
        msg.version_number = 3;
        let next = Message::new(conversation_id, MessageRole::Assistant, "Hello", 1, now);

        let view = MessageVersions::for_message(msg, None, Some(&next));
        assert_eq!(view.versions.len(), 2);
        assert_eq!(view.versions[0].version, 1);
        assert_eq!(view.versions[0].content, "Hi");
        assert!(view.versions[0].is_original);
        assert_eq!(view.versions[1].version, 3);
        assert_eq!(view.versions[1].content, "Hi there");
        assert!(view.versions[1].is_current);
        assert_eq!(view.navigation.next_message_id, Some(next.id));
    }
}
