//! SQLite user and API key repository.

use chrono::{DateTime, Utc};
use parley_core::repository::user::UserRepository;
use parley_types::error::RepositoryError;
use parley_types::user::{ApiKey, User};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, parse_uuid};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: String,
    name: Option<String>,
    email: String,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            id: parse_uuid(&self.id, "user id")?,
            name: self.name,
            email: self.email,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct ApiKeyRow {
    id: String,
    user_id: String,
    key_hash: String,
    name: String,
    created_at: String,
    last_used_at: Option<String>,
}

impl ApiKeyRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            key_hash: row.try_get("key_hash")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
            last_used_at: row.try_get("last_used_at")?,
        })
    }

    fn into_api_key(self) -> Result<ApiKey, RepositoryError> {
        Ok(ApiKey {
            id: parse_uuid(&self.id, "api key id")?,
            user_id: parse_uuid(&self.user_id, "user_id")?,
            key_hash: self.key_hash,
            name: self.name,
            created_at: parse_datetime(&self.created_at)?,
            last_used_at: self.last_used_at.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

fn map_user(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<User>, RepositoryError> {
    match row {
        Some(row) => {
            let user_row =
                UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(Some(user_row.into_user()?))
        }
        None => Ok(None),
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(format_datetime(&user.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(user.clone()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "email '{}' already exists",
                user.email
            ))),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        map_user(row)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        map_user(row)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            let user_row =
                UserRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            users.push(user_row.into_user()?);
        }
        Ok(users)
    }

    async fn save_api_key(&self, key: &ApiKey) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO api_keys (id, user_id, key_hash, name, created_at, last_used_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(key.id.to_string())
        .bind(key.user_id.to_string())
        .bind(&key.key_hash)
        .bind(&key.name)
        .bind(format_datetime(&key.created_at))
        .bind(key.last_used_at.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => {
                Err(RepositoryError::Conflict("api key already registered".to_string()))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM api_keys WHERE key_hash = ?")
            .bind(key_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let key_row =
                    ApiKeyRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(key_row.into_api_key()?))
            }
            None => Ok(None),
        }
    }

    async fn touch_api_key(&self, key_id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(format_datetime(&at))
            .bind(key_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
