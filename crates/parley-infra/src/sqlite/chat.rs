//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `parley-core` using sqlx with split
//! read/write pools: raw queries, private Row structs, reads on `reader`,
//! writes on `writer`.

use chrono::{DateTime, Utc};
use parley_core::chat::repository::ChatRepository;
use parley_types::chat::{Conversation, Message, MessageRole};
use parley_types::error::RepositoryError;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    user_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        Ok(Conversation {
            id: parse_uuid(&self.id, "conversation id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    original_content: Option<String>,
    edited_content: Option<String>,
    is_edited: bool,
    edited_at: Option<String>,
    version_number: i64,
    order_index: i64,
    created_at: String,
    updated_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            conversation_id: row.try_get("conversation_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            original_content: row.try_get("original_content")?,
            edited_content: row.try_get("edited_content")?,
            is_edited: row.try_get("is_edited")?,
            edited_at: row.try_get("edited_at")?,
            version_number: row.try_get("version_number")?,
            order_index: row.try_get("order_index")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Message {
            id: parse_uuid(&self.id, "message id")?,
            conversation_id: parse_uuid(&self.conversation_id, "conversation_id")?,
            role,
            content: self.content,
            original_content: self.original_content,
            edited_content: self.edited_content,
            is_edited: self.is_edited,
            edited_at: self.edited_at.as_deref().map(parse_datetime).transpose()?,
            version_number: self.version_number as u32,
            order_index: self.order_index as u32,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_messages(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Message>, RepositoryError> {
    let mut messages = Vec::with_capacity(rows.len());
    for row in rows {
        let msg_row =
            MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        messages.push(msg_row.into_message()?);
    }
    Ok(messages)
}

fn map_message(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Message>, RepositoryError> {
    match row {
        Some(row) => {
            let msg_row =
                MessageRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(Some(msg_row.into_message()?))
        }
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO conversations (id, user_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.user_id.to_string())
        .bind(&conversation.title)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(conversation.clone())
    }

    async fn get_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let conv_row = ConversationRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(conv_row.into_conversation()?))
            }
            None => Ok(None),
        }
    }

    async fn list_conversations(
        &self,
        user_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut sql = String::from(
            "SELECT * FROM conversations WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
        );

        // SQLite requires a LIMIT before OFFSET; -1 means unbounded.
        match (limit, offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let conv_row = ConversationRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            conversations.push(conv_row.into_conversation()?);
        }

        Ok(conversations)
    }

    async fn insert_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            r#"INSERT INTO messages (id, conversation_id, role, content, original_content, edited_content,
                                     is_edited, edited_at, version_number, order_index, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.conversation_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(&message.original_content)
        .bind(&message.edited_content)
        .bind(message.is_edited)
        .bind(message.edited_at.as_ref().map(format_datetime))
        .bind(message.version_number as i64)
        .bind(message.order_index as i64)
        .bind(format_datetime(&message.created_at))
        .bind(format_datetime(&message.updated_at))
        .execute(&mut *tx)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(RepositoryError::Conflict(format!(
                    "order index {} already used in conversation {}",
                    message.order_index, message.conversation_id
                )));
            }
            Err(e) => return Err(RepositoryError::Query(e.to_string())),
        }

        touch_conversation(&mut tx, &message.conversation_id, &message.created_at).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_message(&self, message_id: &Uuid) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = ?")
            .bind(message_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_message(row)
    }

    async fn update_message(&self, message: &Message) -> Result<(), RepositoryError> {
        let expected = message.version_number as i64 - 1;
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            r#"UPDATE messages
               SET content = ?, original_content = ?, edited_content = ?, is_edited = ?,
                   edited_at = ?, version_number = ?, updated_at = ?
               WHERE id = ? AND version_number = ?"#,
        )
        .bind(&message.content)
        .bind(&message.original_content)
        .bind(&message.edited_content)
        .bind(message.is_edited)
        .bind(message.edited_at.as_ref().map(format_datetime))
        .bind(message.version_number as i64)
        .bind(format_datetime(&message.updated_at))
        .bind(message.id.to_string())
        .bind(expected)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM messages WHERE id = ?")
                .bind(message.id.to_string())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            return Err(match exists {
                Some(_) => RepositoryError::Conflict(format!(
                    "message {} is not at version {expected}",
                    message.id
                )),
                None => RepositoryError::NotFound,
            });
        }

        touch_conversation(&mut tx, &message.conversation_id, &message.updated_at).await?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_message_at(
        &self,
        conversation_id: &Uuid,
        order_index: u32,
    ) -> Result<Option<Message>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM messages WHERE conversation_id = ? AND order_index = ?")
            .bind(conversation_id.to_string())
            .bind(order_index as i64)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_message(row)
    }

    async fn max_order_index(&self, conversation_id: &Uuid) -> Result<Option<u32>, RepositoryError> {
        let row = sqlx::query("SELECT MAX(order_index) AS max_index FROM messages WHERE conversation_id = ?")
            .bind(conversation_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let max: Option<i64> = row
            .try_get("max_index")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(max.map(|v| v as u32))
    }

    async fn history_prefix(
        &self,
        conversation_id: &Uuid,
        upto: u32,
        limit: u32,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM (
                   SELECT * FROM messages
                   WHERE conversation_id = ? AND order_index <= ?
                   ORDER BY order_index DESC
                   LIMIT ?
               ) ORDER BY order_index ASC"#,
        )
        .bind(conversation_id.to_string())
        .bind(upto as i64)
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_messages(&rows)
    }

    async fn list_messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE conversation_id = ? ORDER BY order_index ASC")
            .bind(conversation_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_messages(&rows)
    }
}

/// Move a conversation's `updated_at` inside an open write transaction.
async fn touch_conversation(
    conn: &mut SqliteConnection,
    conversation_id: &Uuid,
    at: &DateTime<Utc>,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
        .bind(format_datetime(at))
        .bind(conversation_id.to_string())
        .execute(conn)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
