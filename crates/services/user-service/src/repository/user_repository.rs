//! User repository implementation over a document collection.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use common::{AppError, AppResult};
use domain::{
    User, FIELD_CUSTOMER_NUMBER, FIELD_EMAIL_ADDRESS, FIELD_ID, FIRST_CUSTOMER_NUMBER,
    MAX_CUSTOMER_NUMBER_ATTEMPTS,
};

use super::collection::{DocumentCollection, Filter};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Timeout applied to collection calls unless configured otherwise
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// User repository trait for dependency injection.
///
/// Absent records are reported as `None`/`false`, never as errors.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user, assigning its id and the next customer number.
    /// The password is stored as given.
    async fn create(&self, user: User) -> AppResult<User>;

    /// Find user by ID
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>>;

    /// First user with the given email address, in store order
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// List all users
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Replace the user with the given ID; `None` if nothing matched or nothing changed.
    /// A replacement that collides on a unique field (`CustomerNumber`) is `InvalidArgument`.
    async fn replace(&self, id: &str, user: User) -> AppResult<Option<User>>;

    /// Delete user by ID, true iff a user was removed
    async fn delete(&self, id: &str) -> AppResult<bool>;

    /// Customer number the next created user would receive
    async fn next_customer_number(&self) -> AppResult<i32>;
}

/// Concrete implementation of UserRepository.
///
/// Customer numbers are `max + 1`. Two concurrent creates can read the same
/// maximum; the collection's unique constraint on `CustomerNumber` rejects the
/// loser, which recomputes and retries.
pub struct UserStore {
    collection: Arc<dyn DocumentCollection<User>>,
    request_timeout: Duration,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(collection: Arc<dyn DocumentCollection<User>>) -> Self {
        Self {
            collection,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the timeout applied to every collection call.
    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Run a collection call under the request timeout, logging failures.
    async fn bounded<F, R>(&self, operation: &'static str, call: F) -> AppResult<R>
    where
        F: Future<Output = AppResult<R>> + Send,
        R: Send,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(AppError::Conflict(field))) => Err(AppError::Conflict(field)),
            Ok(Err(e)) => {
                tracing::error!(operation, error = ?e, "Collection call failed");
                Err(e)
            }
            Err(_) => {
                tracing::error!(
                    operation,
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "Collection call timed out"
                );
                Err(AppError::timeout(operation))
            }
        }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    #[instrument(skip(self, user))]
    async fn create(&self, mut user: User) -> AppResult<User> {
        user.id = User::new_id();

        for attempt in 1..=MAX_CUSTOMER_NUMBER_ATTEMPTS {
            user.customer_number = self.next_customer_number().await?;

            match self
                .bounded("insert_one", self.collection.insert_one(user.clone()))
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user.id,
                        customer_number = user.customer_number,
                        "User created successfully"
                    );
                    return Ok(user);
                }
                Err(AppError::Conflict(field)) => {
                    tracing::warn!(
                        attempt,
                        customer_number = user.customer_number,
                        %field,
                        "Customer number already taken, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        tracing::error!(
            attempts = MAX_CUSTOMER_NUMBER_ATTEMPTS,
            "Could not assign a customer number"
        );
        Err(AppError::conflict("Customer number"))
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.bounded("find_one", self.collection.find_one(Filter::eq(FIELD_ID, id)))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.bounded(
            "find_one",
            self.collection.find_one(Filter::eq(FIELD_EMAIL_ADDRESS, email)),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list(&self) -> AppResult<Vec<User>> {
        self.bounded("find_many", self.collection.find_many(Filter::All))
            .await
    }

    #[instrument(skip(self, user))]
    async fn replace(&self, id: &str, mut user: User) -> AppResult<Option<User>> {
        // The stored _id never changes
        user.id = id.to_string();

        let modified = self
            .bounded(
                "replace_one",
                self.collection
                    .replace_one(Filter::eq(FIELD_ID, id), user.clone()),
            )
            .await
            .map_err(|e| match e {
                // The same replacement can never succeed, so this is not retryable
                AppError::Conflict(field) => {
                    tracing::warn!(user_id = %id, %field, "Replacement violates a unique field");
                    AppError::invalid_argument(format!("{} already in use", field))
                }
                other => other,
            })?;

        if modified > 0 {
            tracing::info!(user_id = %id, "User updated successfully");
            Ok(Some(user))
        } else {
            tracing::warn!(user_id = %id, "User not found or no changes made");
            Ok(None)
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> AppResult<bool> {
        let deleted = self
            .bounded("delete_one", self.collection.delete_one(Filter::eq(FIELD_ID, id)))
            .await?;

        if deleted > 0 {
            tracing::info!(user_id = %id, "User deleted successfully");
            Ok(true)
        } else {
            tracing::warn!(user_id = %id, "User not found");
            Ok(false)
        }
    }

    async fn next_customer_number(&self) -> AppResult<i32> {
        let top = self
            .bounded(
                "find_top_one_sorted_descending",
                self.collection
                    .find_top_one_sorted_descending(FIELD_CUSTOMER_NUMBER),
            )
            .await?;

        match top {
            None => Ok(FIRST_CUSTOMER_NUMBER),
            Some(user) => user
                .customer_number
                .checked_add(1)
                .map(|next| next.max(FIRST_CUSTOMER_NUMBER))
                .ok_or_else(|| AppError::internal("Customer number space exhausted")),
        }
    }
}
