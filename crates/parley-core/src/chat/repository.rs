//! ChatRepository trait definition.
//!
//! Provides persistence for conversations and their ordered messages.

use parley_types::chat::{Conversation, Message};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for conversation and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Create a new conversation.
    fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Get a conversation by its unique ID.
    fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// List a user's conversations, most recently updated first.
    fn list_conversations(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, RepositoryError>> + Send;

    /// Insert a new message and set the conversation's `updated_at` to the
    /// message's `created_at`, atomically.
    ///
    /// Returns `Conflict` if the conversation already has a message at the
    /// same `order_index`, `NotFound` if the conversation does not exist.
    fn insert_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get a message by its unique ID.
    fn get_message(
        &self,
        message_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Persist an overwritten message (content and version fields) and set
    /// the conversation's `updated_at` to the message's, atomically.
    ///
    /// The stored row must be at `version_number - 1`; otherwise the write is
    /// rejected with `Conflict` so a version can never be skipped or applied
    /// twice.
    fn update_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get the message at an exact position in a conversation.
    fn get_message_at(
        &self,
        conversation_id: &Uuid,
        order_index: u32,
    ) -> impl std::future::Future<Output = Result<Option<Message>, RepositoryError>> + Send;

    /// Highest order index in a conversation, `None` if it has no messages.
    fn max_order_index(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<u32>, RepositoryError>> + Send;

    /// The `limit` most recent messages with `order_index <= upto`, ordered
    /// oldest-first.
    fn history_prefix(
        &self,
        conversation_id: &Uuid,
        upto: u32,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// All messages of a conversation ordered by `order_index`.
    fn list_messages(
        &self,
        conversation_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;
}
