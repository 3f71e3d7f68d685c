//! User and API key repository trait definition.

use chrono::{DateTime, Utc};
use parley_types::error::RepositoryError;
use parley_types::user::{ApiKey, User};
use uuid::Uuid;

/// Repository trait for users and their API keys.
///
/// Implementations live in parley-infra (e.g., `SqliteUserRepository`).
pub trait UserRepository: Send + Sync {
    /// Create a user. Returns `Conflict` if the email is already taken.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get_user(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn get_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// All users, oldest first.
    fn list_users(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    /// Store an API key record (hash only).
    fn save_api_key(
        &self,
        key: &ApiKey,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn find_api_key_by_hash(
        &self,
        key_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<ApiKey>, RepositoryError>> + Send;

    /// Record that a key was just used.
    fn touch_api_key(
        &self,
        key_id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
