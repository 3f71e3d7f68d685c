//! Chat service: the entry point used by the HTTP and CLI layers.
//!
//! ChatService owns the repository, the shared conversation locks, the event
//! bus, and the regeneration engine. Sending a message, editing, regenerating,
//! and the read operations all go through here.

use std::sync::Arc;

use chrono::Utc;
use parley_types::chat::{
    ChatExchange, Conversation, EditOutcome, Message, MessageRole, MessageVersions,
    RegenerationOutcome, Transcript,
};
use parley_types::error::ChatError;
use parley_types::event::ConversationEvent;
use tracing::{info, warn};
use uuid::Uuid;

use super::lock::ConversationLocks;
use super::log::MessageLog;
use super::regenerate::{EngineConfig, RegenerationEngine};
use super::repository::ChatRepository;
use crate::event::bus::EventBus;
use crate::gateway::box_gateway::BoxAiGateway;

/// Orchestrates conversations, message versioning, and reply generation.
///
/// Generic over `ChatRepository` so parley-core never depends on
/// parley-infra.
pub struct ChatService<R: ChatRepository> {
    repo: Arc<R>,
    log: MessageLog<R>,
    engine: RegenerationEngine<R>,
    locks: ConversationLocks,
    events: EventBus,
}

impl<R: ChatRepository> ChatService<R> {
    pub fn new(repo: R, gateway: BoxAiGateway, config: EngineConfig) -> Self {
        let repo = Arc::new(repo);
        let locks = ConversationLocks::new();
        let events = EventBus::default();
        let engine = RegenerationEngine::new(
            Arc::clone(&repo),
            Arc::new(gateway),
            locks.clone(),
            events.clone(),
            config,
        );
        Self {
            log: MessageLog::new(Arc::clone(&repo)),
            repo,
            engine,
            locks,
            events,
        }
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &R {
        &self.repo
    }

    /// Event bus carrying committed conversation changes.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn gateway(&self) -> &BoxAiGateway {
        self.engine.gateway()
    }

    // --- Writes ---

    /// Send a user message and generate the assistant reply.
    ///
    /// Without `conversation_id` a new conversation is created, titled from
    /// the message. If anything fails after the user message was stored
    /// (generation or storing the reply), returns `PartialFailure` carrying
    /// that message.
    #[tracing::instrument(skip(self, content), fields(user_id = %user_id))]
    pub async fn send_message(
        &self,
        user_id: Uuid,
        conversation_id: Option<Uuid>,
        content: &str,
    ) -> Result<ChatExchange, ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::Validation(
                "message content must not be empty".to_string(),
            ));
        }

        let conversation = match conversation_id {
            Some(id) => self.owned_conversation(user_id, id).await?,
            None => {
                let conversation = Conversation::new(user_id, content, Utc::now());
                let conversation = self.repo.create_conversation(&conversation).await?;
                info!(conversation_id = %conversation.id, "Conversation created");
                self.events.publish(ConversationEvent::ConversationCreated {
                    conversation: conversation.clone(),
                });
                conversation
            }
        };

        let _guard = self.locks.acquire(conversation.id).await;

        let user_message = self
            .log
            .append(user_id, conversation.id, MessageRole::User, content)
            .await?;
        self.events.publish(ConversationEvent::MessageAppended {
            user_id,
            message: user_message.clone(),
        });

        let (reply, conversation) = match self.reply_to(user_id, &conversation, &user_message).await {
            Ok(done) => done,
            Err(err) => {
                warn!(
                    conversation_id = %conversation.id,
                    error = %err,
                    "Reply failed, user message kept"
                );
                return Err(err.after_commit(&user_message));
            }
        };

        Ok(ChatExchange {
            conversation,
            user_message,
            reply,
        })
    }

    /// Edit a user message; its reply is regenerated if one exists.
    pub async fn edit_message(
        &self,
        user_id: Uuid,
        message_id: Uuid,
        new_content: &str,
    ) -> Result<EditOutcome, ChatError> {
        self.engine.edit(user_id, message_id, new_content).await
    }

    /// Regenerate the reply to a user message without changing it.
    pub async fn regenerate(
        &self,
        user_id: Uuid,
        message_id: Uuid,
    ) -> Result<RegenerationOutcome, ChatError> {
        self.engine.regenerate(user_id, message_id, None).await
    }

    /// Edit a user message and regenerate its reply in one step.
    ///
    /// Unlike [`edit_message`](Self::edit_message), a missing reply is an
    /// error.
    pub async fn edit_and_regenerate(
        &self,
        user_id: Uuid,
        message_id: Uuid,
        new_content: &str,
    ) -> Result<RegenerationOutcome, ChatError> {
        self.engine
            .regenerate(user_id, message_id, Some(new_content))
            .await
    }

    // --- Reads ---

    /// Current state, neighbours, and version history of one message.
    pub async fn message_versions(
        &self,
        user_id: Uuid,
        message_id: Uuid,
    ) -> Result<MessageVersions, ChatError> {
        let message = self
            .repo
            .get_message(&message_id)
            .await?
            .ok_or(ChatError::NotFound("message"))?;
        let conversation = self
            .repo
            .get_conversation(&message.conversation_id)
            .await?
            .ok_or(ChatError::NotFound("conversation"))?;
        if conversation.user_id != user_id {
            return Err(ChatError::Forbidden);
        }

        let previous = self
            .log
            .previous_before(conversation.id, message.order_index)
            .await?;
        let next = self
            .log
            .next_after(conversation.id, message.order_index)
            .await?;

        Ok(MessageVersions::for_message(
            message,
            previous.as_ref(),
            next.as_ref(),
        ))
    }

    /// A user's conversations, most recently updated first.
    pub async fn list_conversations(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Conversation>, ChatError> {
        Ok(self
            .repo
            .list_conversations(&user_id, limit, offset)
            .await?)
    }

    /// A conversation with all its messages in order.
    pub async fn get_transcript(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Transcript, ChatError> {
        let conversation = self.owned_conversation(user_id, conversation_id).await?;
        let messages = self.repo.list_messages(&conversation.id).await?;
        Ok(Transcript {
            conversation,
            messages,
        })
    }

    /// Generate and store the reply to a committed user message. Returns the
    /// reply and the refreshed conversation. Must be called under the lock.
    async fn reply_to(
        &self,
        user_id: Uuid,
        conversation: &Conversation,
        user_message: &Message,
    ) -> Result<(Message, Conversation), ChatError> {
        let text = self.engine.reply_text(user_message).await?;
        let reply = self
            .log
            .append(user_id, conversation.id, MessageRole::Assistant, &text)
            .await?;
        self.events.publish(ConversationEvent::MessageAppended {
            user_id,
            message: reply.clone(),
        });

        let conversation = self
            .repo
            .get_conversation(&conversation.id)
            .await?
            .ok_or(ChatError::NotFound("conversation"))?;
        Ok((reply, conversation))
    }

    /// Conversations owned by someone else read as missing.
    async fn owned_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> Result<Conversation, ChatError> {
        self.repo
            .get_conversation(&conversation_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(ChatError::NotFound("conversation"))
    }
}
