//! User service - Handles user-related business logic.
//!
//! Validates input, hashes credentials and verifies logins on top of the
//! repository. Hashing runs on the blocking pool so the async workers stay free.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use common::{AppError, AppResult};
use domain::{AuthResult, Login, PasswordHasher, User};

use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a user from a profile whose `password` holds the plaintext.
    /// The returned user carries the stored hash.
    async fn create_user(&self, user: User) -> AppResult<User>;

    /// Get user by ID
    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Replace a user wholesale.
    ///
    /// The record is written as given: `customer_number` and `password` are
    /// not re-derived, so callers must carry over the stored number and hash.
    /// A customer number already held by another user is rejected with
    /// `InvalidArgument`; an omitted number is written as `0` and counts too.
    async fn update_user(&self, id: &str, user: User) -> AppResult<Option<User>>;

    /// Delete user by ID, true iff a user was removed
    async fn delete_user(&self, id: &str) -> AppResult<bool>;

    /// Verify a login against the stored hash
    async fn login(&self, login: &Login) -> AppResult<AuthResult>;

    /// Hash the password of a login the same way stored credentials are hashed
    async fn hash_password(&self, login: &Login) -> AppResult<String>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self::with_hasher(repo, PasswordHasher::new())
    }

    /// Create new user service instance with a specific hasher
    pub fn with_hasher(repo: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { repo, hasher }
    }

    async fn hash(&self, plain_text: String) -> AppResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain_text).into_string())
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))
    }

    async fn verify(&self, plain_text: String, stored_hash: String) -> AppResult<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain_text, &stored_hash))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))
    }
}

fn validate_id(id: &str) -> AppResult<()> {
    if id.trim().is_empty() {
        tracing::warn!("Invalid ID provided");
        return Err(AppError::invalid_argument("Invalid ID"));
    }
    Ok(())
}

#[async_trait]
impl UserService for UserManager {
    #[instrument(skip(self, user))]
    async fn create_user(&self, mut user: User) -> AppResult<User> {
        if let Some(plain_text) = user.password.take() {
            user.password = Some(self.hash(plain_text).await?);
        }

        self.repo.create(user).await
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        validate_id(id)?;

        let user = self.repo.find_by_id(id).await?;
        match &user {
            Some(_) => tracing::info!(user_id = %id, "User retrieved successfully"),
            None => tracing::warn!(user_id = %id, "User not found"),
        }
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = self.repo.list().await?;
        tracing::info!(count = users.len(), "Retrieved users");
        Ok(users)
    }

    #[instrument(skip(self, user))]
    async fn update_user(&self, id: &str, user: User) -> AppResult<Option<User>> {
        validate_id(id)?;
        self.repo.replace(id, user).await
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: &str) -> AppResult<bool> {
        validate_id(id)?;
        self.repo.delete(id).await
    }

    #[instrument(skip(self, login), fields(email = ?login.email_address))]
    async fn login(&self, login: &Login) -> AppResult<AuthResult> {
        let (email, password) = login.credentials()?;

        let user = self.repo.find_by_email(email).await?;

        // Unknown users and users without a credential are hashed against "" too
        let stored_hash = user
            .as_ref()
            .and_then(|u| u.password.clone())
            .unwrap_or_default();
        let matched = self.verify(password.to_string(), stored_hash).await?;

        match user {
            Some(user) if matched => {
                tracing::info!(user_id = %user.id, "Login succeeded");
                Ok(AuthResult::matched(user.id))
            }
            _ => {
                tracing::warn!("Login rejected");
                Ok(AuthResult::rejected())
            }
        }
    }

    async fn hash_password(&self, login: &Login) -> AppResult<String> {
        let password = login
            .password
            .clone()
            .ok_or_else(|| AppError::invalid_argument("Password is required"))?;
        self.hash(password).await
    }
}
