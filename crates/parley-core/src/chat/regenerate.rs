//! Reply regeneration engine.
//!
//! Regenerating a reply means: resolve a user message, optionally overwrite
//! it, rebuild the history prefix that ends at it, ask the gateway for a new
//! reply, and overwrite the paired assistant message (order index + 1) as a
//! new version. The whole sequence runs under the conversation lock.
//!
//! Every check (ownership, role, reply presence, content validity) happens
//! before the first write, so a rejected request changes nothing. Once a
//! user edit is committed it stays committed even if generation or storing
//! the reply fails; the caller then receives `ChatError::PartialFailure`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parley_types::chat::{Conversation, EditOutcome, Message, MessageRole, RegenerationOutcome};
use parley_types::config::GlobalConfig;
use parley_types::error::ChatError;
use parley_types::event::ConversationEvent;
use parley_types::gateway::GatewayError;
use tracing::{info, warn};
use uuid::Uuid;

use super::context::build_context;
use super::lock::ConversationLocks;
use super::log::MessageLog;
use super::repository::ChatRepository;
use super::version::apply_edit;
use crate::event::bus::EventBus;
use crate::gateway::box_gateway::BoxAiGateway;

/// Tunables for context size and the gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of messages sent as context (prefix ending at the
    /// target message).
    pub history_limit: u32,
    /// Wraps only the gateway call; database writes are never timed out.
    pub gateway_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            gateway_timeout: None,
        }
    }
}

impl From<&GlobalConfig> for EngineConfig {
    fn from(config: &GlobalConfig) -> Self {
        Self {
            history_limit: config.history_limit.max(1),
            gateway_timeout: match config.gateway.timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// A target user message resolved and checked for the requesting user.
struct Located {
    conversation: Conversation,
    target: Message,
    reply: Option<Message>,
}

/// Orchestrates edit-and-regenerate and plain regenerate requests.
pub struct RegenerationEngine<R: ChatRepository> {
    repo: Arc<R>,
    log: MessageLog<R>,
    gateway: Arc<BoxAiGateway>,
    locks: ConversationLocks,
    events: EventBus,
    config: EngineConfig,
}

impl<R: ChatRepository> RegenerationEngine<R> {
    pub fn new(
        repo: Arc<R>,
        gateway: Arc<BoxAiGateway>,
        locks: ConversationLocks,
        events: EventBus,
        config: EngineConfig,
    ) -> Self {
        Self {
            log: MessageLog::new(Arc::clone(&repo)),
            repo,
            gateway,
            locks,
            events,
            config,
        }
    }

    pub fn gateway(&self) -> &BoxAiGateway {
        &self.gateway
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Regenerate the assistant reply paired with user message `message_id`.
    ///
    /// With `new_content`, the user message is overwritten first.
    ///
    /// Errors:
    /// - `NotFound` if the message, its conversation, or a following
    ///   assistant reply is missing (no writes)
    /// - `Forbidden` if the conversation belongs to another user (no writes)
    /// - `Validation` if the message is not a user message or `new_content`
    ///   is empty (no writes)
    /// - `Gateway` or `Repository` if regeneration failed and nothing was
    ///   written
    /// - `PartialFailure` if the user edit was committed but a later step
    ///   (generation or storing the reply) failed
    #[tracing::instrument(
        name = "regenerate_reply",
        skip(self, new_content),
        fields(user_id = %user_id, message_id = %message_id, edit = new_content.is_some())
    )]
    pub async fn regenerate(
        &self,
        user_id: Uuid,
        message_id: Uuid,
        new_content: Option<&str>,
    ) -> Result<RegenerationOutcome, ChatError> {
        let conversation_id = self.conversation_of(message_id).await?;
        let _guard = self.locks.acquire(conversation_id).await;

        let located = self.locate(user_id, message_id).await?;
        let reply = located
            .reply
            .ok_or(ChatError::NotFound("assistant reply"))?;
        let edited = new_content
            .map(|content| apply_edit(&located.target, content, Utc::now()))
            .transpose()?;

        let user_edited = edited.is_some();
        let target = match edited {
            Some(edited) => {
                self.commit_user_edit(&located.conversation, &edited).await?;
                edited
            }
            None => located.target,
        };

        let regenerated = match self.regenerate_reply(&reply, &target).await {
            Ok(regenerated) => regenerated,
            Err(err) if user_edited => {
                warn!(error = %err, "Regeneration failed after user edit was saved");
                return Err(err.after_commit(&target));
            }
            Err(err) => {
                warn!(error = %err, "Regeneration failed, nothing changed");
                return Err(err);
            }
        };

        info!(
            conversation_id = %located.conversation.id,
            reply_id = %regenerated.id,
            version = regenerated.version_number,
            "Reply regenerated"
        );
        self.events.publish(ConversationEvent::ReplyRegenerated {
            user_id,
            message: regenerated.clone(),
        });

        Ok(RegenerationOutcome {
            user_message: target,
            reply: regenerated,
        })
    }

    /// Edit user message `message_id`, regenerating its reply when one
    /// follows it. Without a paired reply only the edit is applied.
    #[tracing::instrument(
        name = "edit_message",
        skip(self, new_content),
        fields(user_id = %user_id, message_id = %message_id)
    )]
    pub async fn edit(
        &self,
        user_id: Uuid,
        message_id: Uuid,
        new_content: &str,
    ) -> Result<EditOutcome, ChatError> {
        let conversation_id = self.conversation_of(message_id).await?;

        {
            let _guard = self.locks.acquire(conversation_id).await;
            let located = self.locate(user_id, message_id).await?;
            if located.reply.is_none() {
                let edited = apply_edit(&located.target, new_content, Utc::now())?;
                self.commit_user_edit(&located.conversation, &edited).await?;
                return Ok(EditOutcome {
                    user_message: edited,
                    reply: None,
                });
            }
        }

        // A reply exists: run the full regeneration (it re-checks everything
        // under the lock).
        let outcome = self.regenerate(user_id, message_id, Some(new_content)).await?;
        Ok(EditOutcome {
            user_message: outcome.user_message,
            reply: Some(outcome.reply),
        })
    }

    /// Generate new text for `reply` and store it as its next version.
    /// The conversation's `updated_at` moves with the write.
    async fn regenerate_reply(&self, reply: &Message, target: &Message) -> Result<Message, ChatError> {
        let text = self.reply_text(target).await?;
        let regenerated = apply_edit(reply, &text, Utc::now())?;
        self.repo.update_message(&regenerated).await?;
        Ok(regenerated)
    }

    /// Ask the gateway for a reply to `target` using its history prefix.
    ///
    /// Gateway failures come back as `ChatError::Gateway`.
    pub(crate) async fn reply_text(&self, target: &Message) -> Result<String, ChatError> {
        let history = self
            .log
            .history_prefix(target.conversation_id, target.order_index, self.config.history_limit)
            .await?;
        let ctx = build_context(&history, target);

        let call = self.gateway.generate(&ctx.prior_turns, &ctx.prompt);
        let result = match self.config.gateway_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(limit.as_secs())),
            },
            None => call.await,
        };

        match result {
            Ok(text) if text.trim().is_empty() => Err(ChatError::Gateway(GatewayError::EmptyResponse)),
            Ok(text) => Ok(text),
            Err(err) => Err(ChatError::Gateway(err)),
        }
    }

    async fn conversation_of(&self, message_id: Uuid) -> Result<Uuid, ChatError> {
        self.repo
            .get_message(&message_id)
            .await?
            .map(|m| m.conversation_id)
            .ok_or(ChatError::NotFound("message"))
    }

    /// Resolve and check the target. Must be called under the lock.
    async fn locate(&self, user_id: Uuid, message_id: Uuid) -> Result<Located, ChatError> {
        let target = self
            .repo
            .get_message(&message_id)
            .await?
            .ok_or(ChatError::NotFound("message"))?;
        let conversation = self
            .repo
            .get_conversation(&target.conversation_id)
            .await?
            .ok_or(ChatError::NotFound("conversation"))?;

        if conversation.user_id != user_id {
            return Err(ChatError::Forbidden);
        }
        if target.role != MessageRole::User {
            return Err(ChatError::Validation(
                "only user messages can be edited or regenerated".to_string(),
            ));
        }

        let reply = self
            .log
            .next_after(conversation.id, target.order_index)
            .await?
            .filter(|m| m.role == MessageRole::Assistant);

        Ok(Located {
            conversation,
            target,
            reply,
        })
    }

    async fn commit_user_edit(
        &self,
        conversation: &Conversation,
        edited: &Message,
    ) -> Result<(), ChatError> {
        self.repo.update_message(edited).await?;

        info!(
            conversation_id = %conversation.id,
            message_id = %edited.id,
            version = edited.version_number,
            "User message edited"
        );
        self.events.publish(ConversationEvent::MessageEdited {
            user_id: conversation.user_id,
            message: edited.clone(),
        });
        Ok(())
    }
}
