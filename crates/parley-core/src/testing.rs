//! In-memory repositories and a scripted gateway for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parley_types::chat::{Conversation, Message, MessageRole};
use parley_types::error::RepositoryError;
use parley_types::gateway::{GatewayError, Turn};
use parley_types::user::{ApiKey, User};
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::gateway::provider::AiGateway;
use crate::repository::user::UserRepository;

// --- Gateway ---

/// One call observed by [`ScriptedGateway`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prior_turns: Vec<Turn>,
    pub prompt: String,
}

pub type GatewayCalls = Arc<Mutex<Vec<RecordedCall>>>;

/// Gateway that answers from a fixed script and records every call.
///
/// Once the script runs out every call fails with a provider error.
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<String, GatewayError>>>,
    calls: GatewayCalls,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(replies.into_iter().map(|r| Ok(r.into())))
    }

    pub fn failing(err: GatewayError) -> Self {
        Self::scripted([Err(err)])
    }

    pub fn scripted(steps: impl IntoIterator<Item = Result<String, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(steps.into_iter().collect()),
            calls: Arc::default(),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> GatewayCalls {
        Arc::clone(&self.calls)
    }
}

impl AiGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, prior_turns: &[Turn], prompt: &str) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall {
            prior_turns: prior_turns.to_vec(),
            prompt: prompt.to_string(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(GatewayError::Provider {
                message: "script exhausted".to_string(),
            })
        })
    }
}

// --- Chat repository ---

#[derive(Default)]
pub struct InMemoryChatRepository {
    conversations: Mutex<HashMap<Uuid, Conversation>>,
    messages: Mutex<HashMap<Uuid, Message>>,
    fail_assistant_writes: AtomicBool,
}

impl InMemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, inserting or updating an assistant message fails with a
    /// query error and stores nothing.
    pub fn fail_assistant_writes(&self, fail: bool) {
        self.fail_assistant_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self, message: &Message) -> Result<(), RepositoryError> {
        if message.role == MessageRole::Assistant && self.fail_assistant_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        Ok(())
    }

    /// Move a conversation's `updated_at`, as the SQL repository does in the
    /// same transaction as the message write.
    fn touch(&self, conversation_id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        match self.conversations.lock().unwrap().get_mut(conversation_id) {
            Some(conversation) => {
                conversation.updated_at = at;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    /// Insert a conversation whose timestamps lie an hour in the past.
    pub async fn seed_conversation(&self, user_id: Uuid) -> Conversation {
        let conversation = Conversation::new(user_id, "Seeded", Utc::now() - chrono::Duration::hours(1));
        self.create_conversation(&conversation).await.unwrap()
    }

    /// Append a message directly, bypassing the log. Timestamps lie in the past.
    pub async fn seed_message(
        &self,
        conversation: &Conversation,
        role: MessageRole,
        content: &str,
    ) -> Message {
        let index = self
            .max_order_index(&conversation.id)
            .await
            .unwrap()
            .map_or(0, |max| max + 1);
        let at = Utc::now() - chrono::Duration::minutes(30);
        let message = Message::new(conversation.id, role, content, index, at);
        self.insert_message(&message).await.unwrap();
        message
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }

    /// Full state, sorted, for before/after comparisons.
    pub fn snapshot(&self) -> (Vec<Conversation>, Vec<Message>) {
        let mut conversations: Vec<_> = self.conversations.lock().unwrap().values().cloned().collect();
        conversations.sort_by_key(|c| c.id);
        let mut messages: Vec<_> = self.messages.lock().unwrap().values().cloned().collect();
        messages.sort_by_key(|m| m.id);
        (conversations, messages)
    }

    fn sorted_messages(&self, conversation_id: &Uuid) -> Vec<Message> {
        let mut messages: Vec<_> = self
            .messages
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.order_index);
        messages
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        Ok(conversation.clone())
    }

    async fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.conversations.lock().unwrap().get(conversation_id).cloned())
    }

    async fn list_conversations(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut conversations: Vec<_> = self
            .conversations
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        Ok(conversations
            .into_iter()
            .skip(offset.unwrap_or(0).max(0) as usize)
            .take(limit.unwrap_or(i64::MAX).max(0) as usize)
            .collect())
    }

    async fn insert_message(&self, message: &Message) -> Result<(), RepositoryError> {
        self.check_write(message)?;
        if !self.conversations.lock().unwrap().contains_key(&message.conversation_id) {
            return Err(RepositoryError::NotFound);
        }
        {
            let mut messages = self.messages.lock().unwrap();
            let taken = messages.values().any(|m| {
                m.conversation_id == message.conversation_id && m.order_index == message.order_index
            });
            if taken {
                return Err(RepositoryError::Conflict(format!(
                    "order index {} already used",
                    message.order_index
                )));
            }
            messages.insert(message.id, message.clone());
        }
        self.touch(&message.conversation_id, message.created_at)
    }

    async fn get_message(&self, message_id: &Uuid) -> Result<Option<Message>, RepositoryError> {
        Ok(self.messages.lock().unwrap().get(message_id).cloned())
    }

    async fn update_message(&self, message: &Message) -> Result<(), RepositoryError> {
        self.check_write(message)?;
        {
            let mut messages = self.messages.lock().unwrap();
            let stored = messages.get_mut(&message.id).ok_or(RepositoryError::NotFound)?;
            if stored.version_number + 1 != message.version_number {
                return Err(RepositoryError::Conflict(format!(
                    "stale version {} for message {}",
                    message.version_number, message.id
                )));
            }
            *stored = message.clone();
        }
        self.touch(&message.conversation_id, message.updated_at)
    }

    async fn get_message_at(
        &self,
        conversation_id: &Uuid,
        order_index: u32,
    ) -> Result<Option<Message>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .values()
            .find(|m| m.conversation_id == *conversation_id && m.order_index == order_index)
            .cloned())
    }

    async fn max_order_index(&self, conversation_id: &Uuid) -> Result<Option<u32>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.conversation_id == *conversation_id)
            .map(|m| m.order_index)
            .max())
    }

    async fn history_prefix(
        &self,
        conversation_id: &Uuid,
        upto: u32,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let prefix: Vec<_> = self
            .sorted_messages(conversation_id)
            .into_iter()
            .filter(|m| m.order_index <= upto)
            .collect();
        let skip = prefix.len().saturating_sub(limit as usize);
        Ok(prefix.into_iter().skip(skip).collect())
    }

    async fn list_messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
        Ok(self.sorted_messages(conversation_id))
    }
}

// --- User repository ---

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
    keys: Mutex<HashMap<Uuid, ApiKey>>,
}

impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(user.email.clone()));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<_> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn save_api_key(&self, key: &ApiKey) -> Result<(), RepositoryError> {
        self.keys.lock().unwrap().insert(key.id, key.clone());
        Ok(())
    }

    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepositoryError> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .values()
            .find(|k| k.key_hash == key_hash)
            .cloned())
    }

    async fn touch_api_key(&self, key_id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        match self.keys.lock().unwrap().get_mut(key_id) {
            Some(key) => {
                key.last_used_at = Some(at);
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}
