//! Document collection abstraction.
//!
//! The narrow storage capability the user store depends on. Implementations
//! map their own failures onto `AppError`: duplicate keys become `Conflict`,
//! anything else about the backing store becomes `StorageUnavailable`.

use async_trait::async_trait;

use common::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Document selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every document
    All,
    /// Documents whose `field` equals the given string
    Eq(&'static str, String),
}

impl Filter {
    /// Exact-match filter on a single field.
    pub fn eq(field: &'static str, value: impl Into<String>) -> Self {
        Filter::Eq(field, value.into())
    }
}

/// Persisted collection of records of type `T`.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait DocumentCollection<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Insert a record; a unique index violation yields `Conflict`
    async fn insert_one(&self, record: T) -> AppResult<()>;

    /// First record matching the filter, in store order
    async fn find_one(&self, filter: Filter) -> AppResult<Option<T>>;

    /// Every record matching the filter
    async fn find_many(&self, filter: Filter) -> AppResult<Vec<T>>;

    /// Record with the highest value of `field`
    async fn find_top_one_sorted_descending(&self, field: &'static str) -> AppResult<Option<T>>;

    /// Replace the first record matching the filter, returning the modified count
    async fn replace_one(&self, filter: Filter, record: T) -> AppResult<u64>;

    /// Delete the first record matching the filter, returning the deleted count
    async fn delete_one(&self, filter: Filter) -> AppResult<u64>;
}
