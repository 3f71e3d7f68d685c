//! User management and API key authentication.
//!
//! Keys are generated and hashed at the edge (parley-api); this service only
//! ever sees the SHA-256 hash.

use chrono::Utc;
use parley_types::error::{RepositoryError, UserError};
use parley_types::user::{ApiKey, User};
use tracing::{debug, info};
use uuid::Uuid;

use crate::repository::user::UserRepository;

/// Service for registering users and resolving API keys to user ids.
pub struct UserService<U: UserRepository> {
    repo: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U) -> Self {
        Self { repo }
    }

    /// Register a new user.
    ///
    /// The email is trimmed and lowercased before storage.
    pub async fn create_user(&self, name: Option<String>, email: &str) -> Result<User, UserError> {
        let email = normalize_email(email)?;
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        if self
            .repo
            .get_user_by_email(&email)
            .await
            .map_err(storage)?
            .is_some()
        {
            return Err(UserError::EmailTaken(email));
        }

        let user = User {
            id: Uuid::now_v7(),
            name,
            email: email.clone(),
            created_at: Utc::now(),
        };

        let user = self.repo.create_user(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::EmailTaken(email.clone()),
            other => storage(other),
        })?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, UserError> {
        self.repo
            .get_user(&user_id)
            .await
            .map_err(storage)?
            .ok_or(UserError::NotFound)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        self.repo.list_users().await.map_err(storage)
    }

    /// Attach an already-hashed API key to `user_id`.
    pub async fn register_api_key(
        &self,
        user_id: Uuid,
        key_hash: String,
        name: &str,
    ) -> Result<ApiKey, UserError> {
        // Ensure the owner exists before storing the key.
        self.get_user(user_id).await?;

        let key = ApiKey {
            id: Uuid::now_v7(),
            user_id,
            key_hash,
            name: name.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
        };
        self.repo.save_api_key(&key).await.map_err(storage)?;

        info!(user_id = %user_id, key_id = %key.id, "API key registered");
        Ok(key)
    }

    /// Resolve a key hash to its owner. Unknown hashes yield `None`.
    pub async fn authenticate(&self, key_hash: &str) -> Result<Option<Uuid>, UserError> {
        let Some(key) = self
            .repo
            .find_api_key_by_hash(key_hash)
            .await
            .map_err(storage)?
        else {
            debug!("Unknown API key presented");
            return Ok(None);
        };

        self.repo
            .touch_api_key(&key.id, Utc::now())
            .await
            .map_err(storage)?;
        Ok(Some(key.user_id))
    }
}

fn storage(err: RepositoryError) -> UserError {
    UserError::StorageError(err.to_string())
}

/// Minimal shape check: one `@` with non-empty local part and a dotted domain.
fn normalize_email(email: &str) -> Result<String, UserError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(UserError::InvalidEmail(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryUserRepository;

    fn service() -> UserService<InMemoryUserRepository> {
        UserService::new(InMemoryUserRepository::default())
    }

    #[tokio::test]
    async fn create_user_normalizes_email() {
        let svc = service();
        let user = svc
            .create_user(Some("  Ada ".to_string()), " Ada@Example.COM ")
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let svc = service();
        svc.create_user(None, "ada@example.com").await.unwrap();
        let err = svc.create_user(None, "ADA@example.com").await.unwrap_err();
        assert!(matches!(err, UserError::EmailTaken(_)));
    }

    #[tokio::test]
    async fn invalid_emails_are_rejected() {
        let svc = service();
        for bad in ["", "no-at-sign", "@example.com", "a@b", "a@b@c.com", "a b@c.com"] {
            let err = svc.create_user(None, bad).await.unwrap_err();
            assert!(matches!(err, UserError::InvalidEmail(_)), "{bad} accepted");
        }
    }

    #[tokio::test]
    async fn authenticate_resolves_registered_key() {
        let svc = service();
        let user = svc.create_user(None, "ada@example.com").await.unwrap();
        svc.register_api_key(user.id, "hash-1".to_string(), "default")
            .await
            .unwrap();

        assert_eq!(svc.authenticate("hash-1").await.unwrap(), Some(user.id));
        assert_eq!(svc.authenticate("hash-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn register_key_for_unknown_user_fails() {
        let svc = service();
        let err = svc
            .register_api_key(Uuid::now_v7(), "hash".to_string(), "default")
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::NotFound));
    }
}
