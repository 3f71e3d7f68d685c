//! Conversation change events published after successful commits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::{Conversation, Message};

/// A committed change to a conversation.
///
/// Serialized with an internal `type` tag for the WebSocket feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationEvent {
    ConversationCreated {
        conversation: Conversation,
    },
    MessageAppended {
        user_id: Uuid,
        message: Message,
    },
    MessageEdited {
        user_id: Uuid,
        message: Message,
    },
    ReplyRegenerated {
        user_id: Uuid,
        message: Message,
    },
}

impl ConversationEvent {
    /// Owner of the conversation the event belongs to.
    pub fn user_id(&self) -> Uuid {
        match self {
            ConversationEvent::ConversationCreated { conversation } => conversation.user_id,
            ConversationEvent::MessageAppended { user_id, .. }
            | ConversationEvent::MessageEdited { user_id, .. }
            | ConversationEvent::ReplyRegenerated { user_id, .. } => *user_id,
        }
    }

    pub fn conversation_id(&self) -> Uuid {
        match self {
            ConversationEvent::ConversationCreated { conversation } => conversation.id,
            ConversationEvent::MessageAppended { message, .. }
            | ConversationEvent::MessageEdited { message, .. }
            | ConversationEvent::ReplyRegenerated { message, .. } => message.conversation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageRole;
    use chrono::Utc;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let user_id = Uuid::now_v7();
        let message = Message::new(Uuid::now_v7(), MessageRole::Assistant, "Hi", 1, Utc::now());
        let event = ConversationEvent::ReplyRegenerated {
            user_id,
            message: message.clone(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reply_regenerated");
        assert_eq!(event.user_id(), user_id);
        assert_eq!(event.conversation_id(), message.conversation_id);
    }

    #[test]
    fn test_conversation_created_owner() {
        let user_id = Uuid::now_v7();
        let conversation = Conversation::new(user_id, "Hello", Utc::now());
        let event = ConversationEvent::ConversationCreated {
            conversation: conversation.clone(),
        };
        assert_eq!(event.user_id(), user_id);
        assert_eq!(event.conversation_id(), conversation.id);
    }
}
