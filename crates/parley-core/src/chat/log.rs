//! Ordered message log.
//!
//! Maintains the per-conversation transcript: order indices are assigned
//! here (0 for the first message, then max + 1), so indices stay gap-free as
//! long as callers hold the conversation lock while appending.

use std::sync::Arc;

use chrono::Utc;
use parley_types::chat::{Message, MessageRole};
use parley_types::error::ChatError;
use tracing::debug;
use uuid::Uuid;

use super::repository::ChatRepository;

/// Ordered transcript operations over a [`ChatRepository`].
pub struct MessageLog<R: ChatRepository> {
    repo: Arc<R>,
}

impl<R: ChatRepository> Clone for MessageLog<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: ChatRepository> MessageLog<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Append a message at the end of `conversation_id` owned by `user_id`.
    ///
    /// Fails with `NotFound` when the conversation does not exist or belongs
    /// to someone else. Refreshes the conversation's `updated_at`.
    pub async fn append(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation(
                "message content must not be empty".to_string(),
            ));
        }

        let conversation = self
            .repo
            .get_conversation(&conversation_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(ChatError::NotFound("conversation"))?;

        let order_index = match self.repo.max_order_index(&conversation.id).await? {
            Some(max) => max + 1,
            None => 0,
        };

        let now = Utc::now();
        let message = Message::new(conversation.id, role, content, order_index, now);
        self.repo.insert_message(&message).await?;

        debug!(
            conversation_id = %conversation.id,
            message_id = %message.id,
            order_index,
            role = %role,
            "Message appended"
        );

        Ok(message)
    }

    /// Messages with `order_index <= upto`, oldest-first, capped to the
    /// `limit` most recent. Older messages past the cap are dropped.
    pub async fn history_prefix(
        &self,
        conversation_id: Uuid,
        upto: u32,
        limit: u32,
    ) -> Result<Vec<Message>, ChatError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .repo
            .history_prefix(&conversation_id, upto, limit)
            .await?)
    }

    /// The message immediately after `order_index`, if any.
    pub async fn next_after(
        &self,
        conversation_id: Uuid,
        order_index: u32,
    ) -> Result<Option<Message>, ChatError> {
        Ok(self
            .repo
            .get_message_at(&conversation_id, order_index + 1)
            .await?)
    }

    /// The message immediately before `order_index`, if any.
    pub async fn previous_before(
        &self,
        conversation_id: Uuid,
        order_index: u32,
    ) -> Result<Option<Message>, ChatError> {
        match order_index.checked_sub(1) {
            Some(prev) => Ok(self.repo.get_message_at(&conversation_id, prev).await?),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryChatRepository;
    use parley_types::chat::Conversation;

    async fn setup() -> (Arc<InMemoryChatRepository>, MessageLog<InMemoryChatRepository>, Conversation) {
        let repo = Arc::new(InMemoryChatRepository::new());
        let conversation = repo.seed_conversation(Uuid::now_v7()).await;
        let log = MessageLog::new(Arc::clone(&repo));
        (repo, log, conversation)
    }

    #[tokio::test]
    async fn append_assigns_gap_free_indices_from_zero() {
        let (_repo, log, conversation) = setup().await;

        for i in 0..6 {
            let role = if i % 2 == 0 { MessageRole::User } else { MessageRole::Assistant };
            let msg = log
                .append(conversation.user_id, conversation.id, role, &format!("m{i}"))
                .await
                .unwrap();
            assert_eq!(msg.order_index, i);
            assert_eq!(msg.version_number, 1);
        }
    }

    #[tokio::test]
    async fn append_touches_conversation() {
        let (repo, log, conversation) = setup().await;
        log.append(conversation.user_id, conversation.id, MessageRole::User, "Hi")
            .await
            .unwrap();

        let stored = repo.get_conversation(&conversation.id).await.unwrap().unwrap();
        assert!(stored.updated_at > conversation.updated_at);
    }

    #[tokio::test]
    async fn append_to_foreign_conversation_is_not_found() {
        let (repo, log, conversation) = setup().await;
        let err = log
            .append(Uuid::now_v7(), conversation.id, MessageRole::User, "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound("conversation")));
        assert_eq!(repo.message_count(), 0);
    }

    #[tokio::test]
    async fn append_to_missing_conversation_is_not_found() {
        let (_repo, log, conversation) = setup().await;
        let err = log
            .append(conversation.user_id, Uuid::now_v7(), MessageRole::User, "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[tokio::test]
    async fn append_rejects_empty_content() {
        let (_repo, log, conversation) = setup().await;
        let err = log
            .append(conversation.user_id, conversation.id, MessageRole::User, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn history_prefix_keeps_most_recent_oldest_first() {
        let (_repo, log, conversation) = setup().await;
        for i in 0..25 {
            log.append(conversation.user_id, conversation.id, MessageRole::User, &format!("m{i}"))
                .await
                .unwrap();
        }

        let history = log.history_prefix(conversation.id, 24, 20).await.unwrap();
        assert_eq!(history.len(), 20);
        assert_eq!(history.first().unwrap().order_index, 5);
        assert_eq!(history.last().unwrap().order_index, 24);
        assert!(history.windows(2).all(|w| w[0].order_index < w[1].order_index));
    }

    #[tokio::test]
    async fn history_prefix_is_bounded_by_target() {
        let (_repo, log, conversation) = setup().await;
        for i in 0..10 {
            log.append(conversation.user_id, conversation.id, MessageRole::User, &format!("m{i}"))
                .await
                .unwrap();
        }

        let history = log.history_prefix(conversation.id, 3, 20).await.unwrap();
        let indices: Vec<u32> = history.iter().map(|m| m.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);

        assert!(log.history_prefix(conversation.id, 3, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn neighbours_by_index() {
        let (_repo, log, conversation) = setup().await;
        let first = log
            .append(conversation.user_id, conversation.id, MessageRole::User, "Hi")
            .await
            .unwrap();
        let second = log
            .append(conversation.user_id, conversation.id, MessageRole::Assistant, "Hello")
            .await
            .unwrap();

        let next = log.next_after(conversation.id, 0).await.unwrap().unwrap();
        assert_eq!(next.id, second.id);
        assert!(log.next_after(conversation.id, 1).await.unwrap().is_none());

        let prev = log.previous_before(conversation.id, 1).await.unwrap().unwrap();
        assert_eq!(prev.id, first.id);
        assert!(log.previous_before(conversation.id, 0).await.unwrap().is_none());
    }
}
